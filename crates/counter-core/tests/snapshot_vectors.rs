//! Snapshot decode vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use counter_core::snapshot;

use vector_loader::load;

#[test]
fn snapshot_vectors() {
    let files = [
        "scenario_restore.json",
        "stale_average.json",
        "zero_count_dropped.json",
        "bad_key_dropped.json",
        "not_an_object.json",
    ];

    for f in files {
        let v = load(f);
        let res = snapshot::decode(&v.snapshot_bytes());

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let buckets = res.expect("expected ok snapshot");
        let ex = v.expect.expect("missing expect block");
        let got = serde_json::to_value(&buckets).unwrap();
        assert_eq!(got, ex, "vector={}", v.description);
    }
}

#[test]
fn decoded_vector_reencodes_identically() {
    let v = load("scenario_restore.json");
    let buckets = snapshot::decode(&v.snapshot_bytes()).unwrap();
    let again = snapshot::decode(&snapshot::encode(&buckets).unwrap()).unwrap();
    assert_eq!(buckets, again);
}
