use std::path::PathBuf;

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[test]
fn every_demo_project_loads() {
    let mut count = 0;
    for entry in std::fs::read_dir(demos_dir()).expect("demos directory") {
        let path = entry.expect("dir entry").path();
        let project = wf_project::load(&path)
            .unwrap_or_else(|e| panic!("{} failed to load: {e}", path.display()));
        assert!(!project.farms.is_empty(), "{} has no farms", path.display());
        count += 1;
    }
    assert!(count >= 2);
}
