use structopt::StructOpt;
use swt16::cli::command;

fn main() {
    env_logger::init();
    command::terminal_init();
    command::asm(command::SubcommandAsm::from_args());
}
