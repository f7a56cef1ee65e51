fn main() -> shadow_rs::SdResult<()> {
    // exposes git and build metadata to `upload_proxy::version`
    shadow_rs::ShadowBuilder::builder().build()?;
    Ok(())
}
