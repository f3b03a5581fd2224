fn main() -> anyhow::Result<()> {
    registry_processor::BuildScript::from_env()?.run()?;
    Ok(())
}
