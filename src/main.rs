use structopt::StructOpt;
use swt16::cli::command;

fn main() {
    env_logger::init();
    command::terminal_init();
    command::root(command::CommandRoot::from_args());
}
