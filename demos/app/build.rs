fn main() -> anyhow::Result<()> {
    registry_processor::BuildScript::from_env()?
        .collector("demo_di::Module")
        .run()?;
    Ok(())
}
