fn main() {
    stockwatch::cli::run();
}
