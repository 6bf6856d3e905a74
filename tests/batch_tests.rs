use ndarray::{Array3, Array4, Axis};
use psg_importer::batch::stack;
use psg_importer::{unpack, PsgError, Sample};

// Builds a (15, L, 1) batch the way the batching pipeline emits it
fn pipeline_batch(arousal: &[i16], stages: &[i16]) -> Array3<i16> {
    let length = arousal.len();
    Array3::from_shape_fn((15, length, 1), |(row, t, _)| match row {
        0 => arousal[t],
        1 => stages[t],
        lead => (lead as i16 - 2) * 1000 + t as i16,
    })
}

#[test]
fn test_import_export_cycle() {
    let batch = pipeline_batch(&[-1, 0, 1, 0, 1], &[4, 4, 1, 2, 5]);
    let sample = Sample::from_batch(batch.view()).unwrap();

    assert_eq!(sample.len(), 5);
    assert_eq!(sample.arousal().unwrap().to_vec(), vec![-1, 0, 1, 0, 1]);
    assert_eq!(sample.stages().unwrap().to_vec(), vec![4, 4, 1, 2, 5]);
    assert_eq!(sample.signal()[[12, 3]], 12003);

    let exported = sample.export_batch().insert_axis(Axis(2));
    assert_eq!(exported, batch);
}

#[test]
fn test_downsample_after_import() {
    let batch = pipeline_batch(&[0, 1, 0, 1, 0, 1, 0], &[0, 1, 2, 3, 4, 5, 0]);
    let mut sample = Sample::from_batch(batch.view()).unwrap();
    sample.downsample(2).unwrap();

    assert_eq!(sample.len(), 4);
    assert_eq!(sample.arousal().unwrap().to_vec(), vec![0, 0, 0, 0]);
    assert_eq!(sample.stages().unwrap().to_vec(), vec![0, 2, 4, 0]);
    assert_eq!(sample.signal()[[0, 3]], 6);
}

#[test]
fn test_import_rejects_missing_singleton_axis() {
    let batch = Array3::<i16>::zeros((15, 8, 3));
    match Sample::from_batch(batch.view()) {
        Err(PsgError::ContractViolation(msg)) => assert!(msg.contains("[15, 8, 3]")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_stack_and_unpack() {
    let first = Sample::from_batch(pipeline_batch(&[-1, 0, 1], &[0, 1, 2]).view()).unwrap();
    let second = Sample::from_batch(pipeline_batch(&[1, -1, 0], &[3, 4, 5]).view()).unwrap();

    let stacked = stack(&[first, second]).unwrap();
    assert_eq!(stacked.dim(), (2, 15, 3, 1));

    let unpacked = unpack(stacked.view()).unwrap();
    assert_eq!(unpacked.label.row(0).to_vec(), vec![0, 0, 1]);
    assert_eq!(unpacked.mask.row(0).to_vec(), vec![0.0, 1.0, 1.0]);
    assert_eq!(unpacked.label.row(1).to_vec(), vec![1, 0, 0]);
    assert_eq!(unpacked.mask.row(1).to_vec(), vec![1.0, 0.0, 1.0]);
    assert_eq!(unpacked.stage.row(1).to_vec(), vec![3, 4, 5]);
    assert_eq!(unpacked.signal.dim(), (2, 13, 3));
    assert_eq!(unpacked.signal[[1, 1, 2]], 1002.0);
}

#[test]
fn test_stack_rejects_unequal_lengths() {
    let short = Sample::from_batch(pipeline_batch(&[0, 0], &[0, 0]).view()).unwrap();
    let long = Sample::from_batch(pipeline_batch(&[0, 0, 0], &[0, 0, 0]).view()).unwrap();
    assert!(matches!(
        stack(&[short, long]),
        Err(PsgError::ContractViolation(_))
    ));
}

#[test]
fn test_unpack_rejects_wrong_channel_count() {
    let stack = Array4::<i16>::zeros((3, 16, 10, 1));
    assert!(matches!(
        unpack(stack.view()),
        Err(PsgError::ContractViolation(_))
    ));
}
