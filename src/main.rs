fn main() {
    mexpand::cli::run();
}
