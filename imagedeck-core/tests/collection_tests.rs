use imagedeck_core::{decode, encode, next_id, remove_by_id, CoreError, ImageRecord};

fn sample() -> Vec<ImageRecord> {
    vec![
        ImageRecord::new(1, "file:///a.png"),
        ImageRecord::new(2, "file:///b.png"),
        ImageRecord::new(5, "content://media/7"),
    ]
}

#[test]
fn remove_absent_id_keeps_everything() {
    let c = sample();
    assert_eq!(remove_by_id(&c, 99), c);
}

#[test]
fn remove_present_id_keeps_order() {
    let c = sample();
    let out = remove_by_id(&c, 2);
    assert_eq!(out, vec![c[0].clone(), c[2].clone()]);
}

#[test]
fn remove_twice_same_as_once() {
    let c = sample();
    let once = remove_by_id(&c, 1);
    let twice = remove_by_id(&once, 1);
    assert_eq!(once, twice);
}

#[test]
fn encode_then_decode_is_identity() {
    let c = sample();
    let raw = encode(&c).unwrap();
    assert_eq!(decode(&raw).unwrap(), c);
    assert_eq!(decode(&encode(&[]).unwrap()).unwrap(), vec![]);
}

#[test]
fn stored_shape_is_flat_array() {
    let raw = encode(&[ImageRecord::new(1, "a")]).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v, serde_json::json!([{ "id": 1, "uri": "a" }]));
}

#[test]
fn decode_blank_is_empty() {
    assert!(decode("").unwrap().is_empty());
    assert!(decode("   ").unwrap().is_empty());
}

#[test]
fn decode_rejects_wrong_shapes() {
    for raw in ["null", "{}", "[1,2]", "not json", r#"[{"id":"x","uri":"a"}]"#] {
        assert!(matches!(decode(raw), Err(CoreError::Malformed(_))), "accepted {raw}");
    }
}

#[test]
fn next_id_after_max() {
    assert_eq!(next_id(&[]), Ok(1));
    assert_eq!(next_id(&sample()), Ok(6));
}

#[test]
fn next_id_exhausted_at_max_id() {
    let c = vec![ImageRecord::new(3, "a"), ImageRecord::new(i64::MAX, "b")];
    assert!(matches!(next_id(&c), Err(CoreError::Invalid(_))));
    assert_eq!(next_id(&[ImageRecord::new(i64::MAX - 1, "a")]), Ok(i64::MAX));
}
