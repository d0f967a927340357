fn main() -> std::process::ExitCode {
  champion_tracker_lib::run()
}
