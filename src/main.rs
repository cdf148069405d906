fn main() -> std::process::ExitCode {
    riskwatch_lib::run()
}
