mod app;

use anyhow::Result;
use app::{CliArgs, USAGE};

fn main() -> Result<()> {
    let args = CliArgs::from_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    app::run(&args)
}
