fn main() {
    formwire::run();
}
