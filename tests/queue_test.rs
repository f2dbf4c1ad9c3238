use std::thread;

use document_gateway::{submission_queue, SubmissionId, SubmitError};

#[test]
fn test_fifo_order_and_sequential_ids() {
    let (tx, mut rx) = submission_queue::<u32>(None);

    for n in 0..5 {
        assert_eq!(tx.push(n, "sig").unwrap(), SubmissionId(n as u64));
    }
    assert_eq!(tx.depth(), 5);

    let drained: Vec<u32> = std::iter::from_fn(|| rx.try_pop())
        .map(|s| *s.document())
        .collect();
    assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    assert_eq!(rx.depth(), 0);
    assert!(rx.try_pop().is_none());
}

#[test]
fn test_peek_does_not_consume() {
    let (tx, mut rx) = submission_queue::<&'static str>(None);
    tx.push("first", "sig-1").unwrap();
    tx.push("second", "sig-2").unwrap();

    assert_eq!(rx.peek().map(|s| *s.document()), Some("first"));
    assert_eq!(rx.peek().map(|s| s.signature().to_string()), Some("sig-1".to_string()));
    assert_eq!(rx.depth(), 2);

    let popped = rx.try_pop().unwrap();
    assert_eq!(*popped.document(), "first");
    assert_eq!(rx.peek().map(|s| *s.document()), Some("second"));
}

#[test]
fn test_sanity_bound_rejects_with_overloaded() {
    let (tx, mut rx) = submission_queue::<u8>(Some(2));
    tx.push(1, "sig").unwrap();
    tx.push(2, "sig").unwrap();

    assert_eq!(tx.push(3, "sig"), Err(SubmitError::Overloaded { depth: 2 }));
    assert_eq!(tx.depth(), 2);

    rx.try_pop().unwrap();
    assert!(tx.push(4, "sig").is_ok());
}

#[test]
fn test_closed_queue_rejects_pushes() {
    let (tx, _rx) = submission_queue::<u8>(None);
    tx.close();

    assert!(tx.is_closed());
    assert_eq!(tx.push(1, "sig"), Err(SubmitError::Closed));
    assert_eq!(tx.depth(), 0);
}

#[test]
fn test_discard_drops_everything_and_closes() {
    let (tx, mut rx) = submission_queue::<u8>(None);
    for n in 0..4 {
        tx.push(n, "sig").unwrap();
    }
    rx.peek();

    assert_eq!(rx.discard(), 4);
    assert_eq!(rx.depth(), 0);
    assert!(rx.try_pop().is_none());
    assert_eq!(tx.push(9, "sig"), Err(SubmitError::Closed));
}

#[test]
fn test_per_producer_order_is_preserved() {
    let (tx, mut rx) = submission_queue::<(usize, usize)>(None);

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let tx = tx.clone();
            thread::spawn(move || {
                for seq in 0..250 {
                    tx.push((producer, seq), "sig").unwrap();
                }
            })
        })
        .collect();
    for handle in producers {
        handle.join().unwrap();
    }

    let mut next_seq = [0usize; 4];
    let mut total = 0;
    while let Some(submission) = rx.try_pop() {
        let (producer, seq) = *submission.document();
        assert_eq!(seq, next_seq[producer]);
        next_seq[producer] += 1;
        total += 1;
    }
    assert_eq!(total, 1_000);
}
