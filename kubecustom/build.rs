fn main() {
    let _shadow = shadow_rs::ShadowBuilder::builder()
        .build()
        .expect("Generating build information should always succeed");
}
