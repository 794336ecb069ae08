//! End-to-end tests of the public fit/query surface on small synthetic
//! datasets.

use recomendar::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn ids<K: Clone>(recs: &[Rec<K>]) -> Vec<K> {
    recs.iter().map(|r| r.id.clone()).collect()
}

#[test]
fn test_no_training_data() {
    let data = Dataset::<i32, &str>::new();
    let mut recommender = Recommender::new();
    let err = recommender.fit_explicit(&data).unwrap_err();
    assert_eq!(err.to_string(), "No training data");
    assert!(!recommender.is_fitted());
}

#[test]
fn test_rated_items_are_excluded() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(1, "B", 1.0);
    data.push(1, "C", 1.0);
    data.push(1, "D", 1.0);
    data.push(2, "C", 1.0);
    data.push(2, "D", 1.0);
    data.push(2, "E", 1.0);
    data.push(2, "F", 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    let mut item_ids = ids(&recommender.user_recs(&1, 5));
    item_ids.sort_unstable();
    assert_eq!(item_ids, vec!["E", "F"]);

    let mut item_ids = ids(&recommender.user_recs(&2, 5));
    item_ids.sort_unstable();
    assert_eq!(item_ids, vec!["A", "B"]);
}

#[test]
fn test_item_recs_excludes_query_item() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(1, "B", 1.0);
    data.push(2, "C", 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    let item_ids = ids(&recommender.item_recs(&"A", 5));
    assert_eq!(item_ids, vec!["B", "C"]);
}

#[test]
fn test_item_recs_scores_stay_in_cosine_bounds() {
    let mut data = Dataset::new();
    data.push(1, "A", 5.0);
    data.push(1, "B", 2.0);
    data.push(2, "A", 4.0);
    data.push(2, "C", 1.0);
    data.push(3, "B", 3.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    for rec in recommender.item_recs(&"A", 10) {
        assert!(rec.score <= 1.0 + 1e-4);
        assert!(rec.score >= -1.0 - 1e-4);
    }
}

#[test]
fn test_similar_users() {
    let mut data = Dataset::new();
    data.push(1, "A", 5.0);
    data.push(2, "A", 4.0);
    data.push(3, "B", 2.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    let similar = recommender.similar_users(&1, 5);
    assert_eq!(similar.len(), 2);
    assert!(!ids(&similar).contains(&1));

    assert!(recommender.similar_users(&1000, 5).is_empty());
}

#[test]
fn test_user_recs_unknown_user_is_empty() {
    let mut data = Dataset::new();
    data.push(1, 1, 5.0);
    data.push(2, 1, 3.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    assert!(recommender.user_recs(&1000, 5).is_empty());
}

#[test]
fn test_user_recs_respects_count() {
    let mut data = Dataset::new();
    for item in 0..10 {
        data.push(1, item, 1.0);
        data.push(2, item, 1.0);
    }
    data.push(2, 100, 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    assert!(recommender.user_recs(&1, 1).len() <= 1);
}

#[test]
fn test_ids_enumerate_in_first_seen_order() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(1, "B", 1.0);
    data.push(2, "B", 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    assert_eq!(recommender.user_ids(), &[1, 2]);
    assert_eq!(recommender.item_ids(), &["A", "B"]);
}

#[test]
fn test_factor_accessors() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(1, "B", 1.0);
    data.push(2, "B", 1.0);

    let mut recommender = Recommender::new().with_factors(20);
    recommender.fit_explicit(&data).expect("non-empty dataset");

    assert_eq!(recommender.user_factors(&1).map(<[f32]>::len), Some(20));
    assert_eq!(recommender.item_factors(&"A").map(<[f32]>::len), Some(20));
    assert!(recommender.user_factors(&3).is_none());
    assert!(recommender.item_factors(&"C").is_none());
}

#[test]
fn test_predict_falls_back_to_global_mean() {
    let mut data = Dataset::new();
    data.push(1, "A", 5.0);
    data.push(2, "A", 3.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    assert!((recommender.global_mean() - 4.0).abs() < 1e-6);
    assert!((recommender.predict(&100, &"A") - 4.0).abs() < 1e-6);
    assert!((recommender.predict(&1, &"unseen") - 4.0).abs() < 1e-6);
}

#[test]
fn test_implicit_global_mean_is_zero() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(2, "A", 1.0);
    data.push(2, "B", 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_implicit(&data).expect("non-empty dataset");

    assert_eq!(recommender.global_mean(), 0.0);
    assert!((recommender.predict(&5, &"A") - 0.0).abs() < 1e-6);
}

#[test]
fn test_implicit_item_recs_excludes_query_item() {
    let mut data = Dataset::new();
    data.push(1, "A", 1.0);
    data.push(1, "B", 1.0);
    data.push(2, "A", 1.0);
    data.push(2, "C", 1.0);

    let mut recommender = Recommender::new();
    recommender.fit_implicit(&data).expect("non-empty dataset");

    let item_ids = ids(&recommender.item_recs(&"A", 10));
    assert!(!item_ids.contains(&"A"));
    assert!(!item_ids.is_empty());
}

#[test]
fn test_callback_runs_once_per_iteration() {
    let mut data = Dataset::new();
    data.push(1, 1, 5.0);

    let infos = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&infos);
    let mut recommender =
        Recommender::new().with_callback(move |info: FitInfo| sink.borrow_mut().push(info));
    recommender.fit_explicit(&data).expect("non-empty dataset");

    let infos = infos.borrow();
    assert_eq!(infos.len(), 20);
    for (index, info) in infos.iter().enumerate() {
        assert_eq!(info.iteration, index + 1);
        assert!(info.train_loss.is_finite());
        // no validation set was supplied
        assert_eq!(info.valid_loss, 0.0);
    }
}

#[test]
fn test_callback_implicit_reports_nan_losses() {
    let mut data = Dataset::new();
    data.push(1, 1, 1.0);
    data.push(2, 1, 1.0);

    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let mut recommender = Recommender::new()
        .with_iterations(3)
        .with_callback(move |info: FitInfo| {
            assert!(info.train_loss.is_nan());
            assert!(info.valid_loss.is_nan());
            *sink.borrow_mut() += 1;
        });
    recommender.fit_implicit(&data).expect("non-empty dataset");

    assert_eq!(*count.borrow(), 3);
}

#[test]
fn test_fit_eval_explicit_reports_validation_loss() {
    let mut train = Dataset::new();
    train.push(1, "A", 5.0);
    train.push(1, "B", 3.0);
    train.push(2, "A", 4.0);
    let mut valid = Dataset::new();
    valid.push(2, "B", 4.0);

    let last = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&last);
    let mut recommender = Recommender::new()
        .with_callback(move |info: FitInfo| *sink.borrow_mut() = Some(info));
    recommender
        .fit_eval_explicit(&train, &valid)
        .expect("non-empty dataset");

    let info = last.borrow().clone().expect("callback ran");
    assert_eq!(info.iteration, 20);
    assert!(info.valid_loss.is_finite());
    assert!(info.valid_loss >= 0.0);
}

#[test]
fn test_seeded_factor_init_is_reproducible() {
    let mut data = Dataset::new();
    data.push(1, "A", 5.0);
    data.push(2, "B", 3.0);

    // zero iterations leaves the factors at their initial values
    let mut first = Recommender::new().with_iterations(0).with_seed(42);
    first.fit_explicit(&data).expect("non-empty dataset");
    let mut second = Recommender::new().with_iterations(0).with_seed(42);
    second.fit_explicit(&data).expect("non-empty dataset");

    assert_eq!(first.user_factors(&1), second.user_factors(&1));
    assert_eq!(first.item_factors(&"B"), second.item_factors(&"B"));

    let mut other = Recommender::new().with_iterations(0).with_seed(43);
    other.fit_explicit(&data).expect("non-empty dataset");
    assert_ne!(first.user_factors(&1), other.user_factors(&1));
}

#[test]
fn test_rmse_of_perfect_model_on_empty_factors() {
    let mut data = Dataset::new();
    data.push(1, "A", 3.0);
    data.push(2, "A", 3.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&data).expect("non-empty dataset");

    // evaluating against unseen ids reduces to the global-mean fallback
    let mut unseen = Dataset::new();
    unseen.push(9, "Z", 3.0);
    assert!(recommender.rmse(&unseen) < 1e-6);
}

#[test]
fn test_refit_replaces_model() {
    let mut first = Dataset::new();
    first.push(1, "A", 1.0);
    let mut second = Dataset::new();
    second.push(7, "X", 1.0);
    second.push(7, "Y", 2.0);

    let mut recommender = Recommender::new();
    recommender.fit_explicit(&first).expect("non-empty dataset");
    recommender.fit_explicit(&second).expect("non-empty dataset");

    assert_eq!(recommender.user_ids(), &[7]);
    assert_eq!(recommender.item_ids(), &["X", "Y"]);
}
