use xumeng::cmdline;

fn main() -> Result<(), cmdline::Error> {
    pretty_env_logger::init();
    cmdline::launch(std::env::args().collect())
}
