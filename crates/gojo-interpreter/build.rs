fn main() {
    build_deps::rerun_if_changed_paths("../../res/examples/**/*.js").expect("could not read path");
}
