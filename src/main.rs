fn main() -> anyhow::Result<()> {
    notedown::cli::run()
}
