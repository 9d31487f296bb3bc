use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let initial_source = std::env::args().nth(1);
    cropper::run(initial_source).context("cropper exited with an error")
}
