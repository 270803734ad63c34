use miette::Result;

fn main() -> Result<()> {
    relog::run()
}
