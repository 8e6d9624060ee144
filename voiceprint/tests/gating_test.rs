use serde_json::json;
use voxclone_voiceprint::{
    CombineMethod, EmbeddingRecord, EmbeddingVector, ReferenceSet, Thresholds, check_consistency,
    classify, combine, cosine_similarity, load_embedding,
};

fn speaker(seed: f32, dim: usize) -> Vec<f32> {
    (0..dim).map(|i| ((i as f32 + seed) * 0.11).sin()).collect()
}

fn jitter(v: &[f32], amount: f32) -> EmbeddingVector {
    EmbeddingVector::new(
        v.iter()
            .enumerate()
            .map(|(i, x)| x + amount * ((i * 7) as f32).cos())
            .collect(),
    )
}

#[test]
fn t_e2e_reference_build_and_gate() {
    let expected = json!({
        "consistent": true,
        "same_speaker": "ok",
        "other_speaker": "reject",
        "record_count": 3,
        "record_method": "weighted_average",
    });

    let base = speaker(0.0, 256);
    let refs = ReferenceSet::new(vec![
        jitter(&base, 0.02),
        jitter(&base, -0.03),
        jitter(&base, 0.05),
    ])
    .unwrap();

    let report = check_consistency(&refs, 0.6).unwrap();
    let combined = combine(&refs, &CombineMethod::WeightedAverage).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.json");
    EmbeddingRecord::combined(&combined, &CombineMethod::WeightedAverage, refs.len())
        .save(&path)
        .unwrap();
    let reference = load_embedding(&path).unwrap();
    let record = EmbeddingRecord::load(&path).unwrap();

    let thresholds = Thresholds::default();
    let same = cosine_similarity(&reference, &jitter(&base, 0.04)).unwrap();
    let other = cosine_similarity(&reference, &speaker(40.0, 256)).unwrap();

    let got = json!({
        "consistent": report.is_consistent().unwrap(),
        "same_speaker": classify(same, &thresholds),
        "other_speaker": classify(other, &thresholds),
        "record_count": record.count.unwrap(),
        "record_method": record.method.unwrap(),
    });

    assert_eq!(got, expected);
}
