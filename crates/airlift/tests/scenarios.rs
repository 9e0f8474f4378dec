//! Scenario tests using airlift-testkit.

#[tokio::test]
async fn five_passengers_capacity_two() {
    // Three boarding cycles: loads 2, 2, 1.
    airlift_testkit::run_capacity_scenario(2, 5).await;
}

#[tokio::test]
async fn capacity_one_serializes_every_passenger() {
    airlift_testkit::run_capacity_scenario(1, 4).await;
}

#[tokio::test]
async fn capacity_exceeds_passenger_count() {
    airlift_testkit::run_capacity_scenario(8, 3).await;
}

#[tokio::test]
async fn exact_multiple_of_capacity() {
    airlift_testkit::run_capacity_scenario(3, 9).await;
}

#[tokio::test]
async fn larger_crowd() {
    airlift_testkit::run_capacity_scenario(4, 25).await;
}

#[tokio::test]
async fn single_passenger_flight_empties_on_first_disembark() {
    airlift_testkit::run_single_passenger_scenario().await;
}

#[tokio::test]
async fn no_passengers_no_deadlock() {
    airlift_testkit::run_empty_rounds_scenario().await;
}

#[tokio::test]
async fn delivery_aggregates_are_idempotent() {
    airlift_testkit::run_idempotent_aggregates(2, 5).await;
}
