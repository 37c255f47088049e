use argh::FromArgs;
mod cmd_apply;
mod cmd_suite;

#[derive(FromArgs)]
/// Apply ordered sound changes to a lexicon
struct Args {
    #[argh(subcommand)]
    subcommand: Subcommand,
}

#[derive(FromArgs)]
/// run something
#[argh(subcommand)]
enum Subcommand {
    Apply(cmd_apply::Apply),
    Suite(cmd_suite::RunSuite),
}

impl Subcommand {
    fn run(self) {
        match self {
            Subcommand::Apply(cmd) => cmd.run(),
            Subcommand::Suite(cmd) => cmd.run(),
        }
    }
}

fn main() {
    env_logger::init();

    argh::from_env::<Args>().subcommand.run();
}
