use droidremote_proto::state::RememberedAddress;

fn store_in(dir: &tempfile::TempDir) -> RememberedAddress {
    RememberedAddress::new(dir.path().join("nested").join("autoconnect.txt"))
}

#[test]
fn missing_file_means_no_address() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    assert_eq!(store.load(), None);
    // Clearing a file that never existed is not an error.
    store.clear().expect("clear on missing file");
}

#[test]
fn remember_on_persists_address() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.apply("192.168.1.44", true).expect("persist");
    assert_eq!(store.load().as_deref(), Some("192.168.1.44"));

    let raw = std::fs::read_to_string(store.path()).expect("read back");
    assert_eq!(raw.lines().count(), 1);
}

#[test]
fn remember_off_removes_previous_address() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.apply("10.0.0.7", true).expect("persist");
    store.apply("10.0.0.7", false).expect("forget");

    assert!(!store.path().exists());
    assert_eq!(store.load(), None);
}

#[test]
fn later_connect_overwrites_remembered_address() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.apply("10.0.0.7", true).expect("first");
    store.apply("10.0.0.8", true).expect("second");

    assert_eq!(store.load().as_deref(), Some("10.0.0.8"));
}

#[test]
fn blank_file_means_no_address() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("autoconnect.txt");
    std::fs::write(&path, "   \n").expect("write");

    assert_eq!(RememberedAddress::new(path).load(), None);
}

#[test]
fn only_first_line_is_used() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("autoconnect.txt");
    std::fs::write(&path, "  192.168.0.9  \nleftover\n").expect("write");

    assert_eq!(
        RememberedAddress::new(path).load().as_deref(),
        Some("192.168.0.9")
    );
}

#[test]
fn address_is_stored_exactly_as_used() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);

    store.apply(" 10.0.0.9", true).expect("persist");
    assert_eq!(store.load().as_deref(), Some(" 10.0.0.9"));
}
