fn main() -> anyhow::Result<()> {
    hcard::hcard::run()
}
