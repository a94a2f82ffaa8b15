mod common;

use std::sync::Arc;

use common::{admin, jan, register, services, trip_request};
use fleet_manager::models::{Actor, TripDataUpdate, TripStatus, VehicleKind, VehicleStatus};
use fleet_manager::repositories::MaintenanceFilter;
use fleet_manager::services::FleetEvent;
use fleet_manager::utils::errors::AppError;
use futures::future::join_all;
use uuid::Uuid;

#[tokio::test]
async fn test_driver_cannot_start_two_trips_sequentially() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck_a = register(&s, VehicleKind::Truck, 0).await;
    let truck_b = register(&s, VehicleKind::Truck, 0).await;

    let trip_a = s
        .trips
        .create_trip(&admin, trip_request(truck_a.id, driver.user_id, 1, 3))
        .await
        .unwrap();
    let trip_b = s
        .trips
        .create_trip(&admin, trip_request(truck_b.id, driver.user_id, 5, 7))
        .await
        .unwrap();

    s.trips
        .transition_status(&driver, trip_a.id, TripStatus::InProgress)
        .await
        .unwrap();
    let err = s
        .trips
        .transition_status(&driver, trip_b.id, TripStatus::InProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DriverAlreadyActive(id) if id == driver.user_id));
    let trip_b = s.trips.get_trip(&admin, trip_b.id).await.unwrap();
    assert_eq!(trip_b.status, TripStatus::Pending);
    assert_eq!(
        s.vehicles.get_vehicle(truck_b.id).await.unwrap().status,
        VehicleStatus::Available
    );
}

#[tokio::test]
async fn test_driver_cannot_start_two_trips_concurrently() {
    let s = Arc::new(services());
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());

    let mut trip_ids = Vec::new();
    for i in 0..4 {
        let truck = register(&s, VehicleKind::Truck, 0).await;
        let trip = s
            .trips
            .create_trip(&admin, trip_request(truck.id, driver.user_id, 1 + i * 3, 2 + i * 3))
            .await
            .unwrap();
        trip_ids.push(trip.id);
    }

    let handles = trip_ids.iter().map(|&trip_id| {
        let s = s.clone();
        tokio::spawn(async move {
            s.trips
                .transition_status(&driver, trip_id, TripStatus::InProgress)
                .await
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let started = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(started, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::DriverAlreadyActive(_))));

    let active = s
        .trips
        .list_trips(&driver)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.status == TripStatus::InProgress)
        .count();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_vehicle_windows_cannot_overlap() {
    let s = services();
    let admin = admin();
    let truck = register(&s, VehicleKind::Truck, 0).await;

    s.trips
        .create_trip(&admin, trip_request(truck.id, Uuid::new_v4(), 10, 15))
        .await
        .unwrap();

    let err = s
        .trips
        .create_trip(&admin, trip_request(truck.id, Uuid::new_v4(), 12, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OverlappingAssignment(id) if id == truck.id));

    let trip = s
        .trips
        .create_trip(&admin, trip_request(truck.id, Uuid::new_v4(), 16, 20))
        .await
        .unwrap();
    assert_eq!(trip.start_date, jan(16));
}

#[tokio::test]
async fn test_concurrent_creation_claims_a_window_once() {
    let s = Arc::new(services());
    let admin = admin();
    let truck_id = register(&s, VehicleKind::Truck, 0).await.id;

    let handles = (0..5).map(|_| {
        let s = s.clone();
        tokio::spawn(async move {
            s.trips
                .create_trip(&admin, trip_request(truck_id, Uuid::new_v4(), 10, 15))
                .await
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(s.trips.list_trips(&admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_trip_without_end_date_is_rejected() {
    let s = services();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let mut request = trip_request(truck.id, Uuid::new_v4(), 1, 2);
    request.end_date = None;

    let err = s.trips.create_trip(&admin(), request).await.unwrap_err();
    assert!(matches!(err, AppError::IncompleteWindow(_)));
}

#[tokio::test]
async fn test_fuel_consumption_must_be_plausible() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 1_000).await;
    let trip = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 1, 2))
        .await
        .unwrap();

    let trip = s
        .trips
        .update_trip_data(
            &driver,
            trip.id,
            TripDataUpdate {
                end_odometer: Some(1_100),
                fuel_used: Some(15.0),
                ..TripDataUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(trip.distance(), 100);

    let err = s
        .trips
        .update_trip_data(
            &driver,
            trip.id,
            TripDataUpdate {
                fuel_used: Some(200.0),
                ..TripDataUpdate::default()
            },
        )
        .await
        .unwrap_err();
    match err {
        AppError::ImplausibleFuelConsumption { consumption, min, max } => {
            assert!((consumption - 200.0).abs() < f64::EPSILON);
            assert_eq!((min, max), (10.0, 100.0));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let stored = s.trips.get_trip(&admin, trip.id).await.unwrap();
    assert_eq!(stored.fuel_used, Some(15.0));
}

#[tokio::test]
async fn test_completed_trip_rejects_any_data_update() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let trip = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 1, 2))
        .await
        .unwrap();
    s.trips
        .transition_status(&driver, trip.id, TripStatus::InProgress)
        .await
        .unwrap();
    s.trips
        .transition_status(&driver, trip.id, TripStatus::Completed)
        .await
        .unwrap();

    for update in [
        TripDataUpdate::default(),
        TripDataUpdate {
            notes: Some("late note".to_string()),
            ..TripDataUpdate::default()
        },
        TripDataUpdate {
            end_odometer: Some(500),
            fuel_used: Some(100.0),
            ..TripDataUpdate::default()
        },
    ] {
        let err = s
            .trips
            .update_trip_data(&driver, trip.id, update)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TripAlreadyCompleted(id) if id == trip.id));
    }
}

#[tokio::test]
async fn test_completion_triggers_deferred_oil_change() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let trip = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 1, 2))
        .await
        .unwrap();
    s.trips
        .transition_status(&driver, trip.id, TripStatus::InProgress)
        .await
        .unwrap();

    s.trips
        .update_trip_data(
            &driver,
            trip.id,
            TripDataUpdate {
                end_odometer: Some(12_000),
                ..TripDataUpdate::default()
            },
        )
        .await
        .unwrap();
    let in_route = s.vehicles.get_vehicle(truck.id).await.unwrap();
    assert_eq!(in_route.status, VehicleStatus::InUse);
    assert_eq!(in_route.current_odometer, 12_000);

    let mut events = s.events.subscribe();
    s.trips
        .transition_status(&driver, trip.id, TripStatus::Completed)
        .await
        .unwrap();

    let truck = s.vehicles.get_vehicle(truck.id).await.unwrap();
    assert_eq!(truck.status, VehicleStatus::Maintenance);
    let pending = s
        .maintenance
        .list_maintenance(&MaintenanceFilter {
            target_id: Some(truck.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let mut saw_completion = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, FleetEvent::TripCompleted { distance: 12_000, .. }) {
            saw_completion = true;
        }
    }
    assert!(saw_completion);
}

#[tokio::test]
async fn test_vehicle_on_the_road_cannot_start_a_second_trip() {
    let s = services();
    let admin = admin();
    let first_driver = Actor::driver(Uuid::new_v4());
    let second_driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let first = s
        .trips
        .create_trip(&admin, trip_request(truck.id, first_driver.user_id, 1, 5))
        .await
        .unwrap();
    let second = s
        .trips
        .create_trip(&admin, trip_request(truck.id, second_driver.user_id, 10, 12))
        .await
        .unwrap();

    s.trips
        .transition_status(&first_driver, first.id, TripStatus::InProgress)
        .await
        .unwrap();
    let err = s
        .trips
        .transition_status(&second_driver, second.id, TripStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(
        s.trips.get_trip(&admin, second.id).await.unwrap().status,
        TripStatus::Pending
    );

    s.trips
        .transition_status(&first_driver, first.id, TripStatus::Completed)
        .await
        .unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Available
    );

    s.trips
        .transition_status(&second_driver, second.id, TripStatus::InProgress)
        .await
        .unwrap();
    assert!(matches!(
        s.vehicles.set_status(truck.id, VehicleStatus::Maintenance).await,
        Err(AppError::InvalidTransition(_))
    ));
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::InUse
    );
}

#[tokio::test]
async fn test_vehicle_with_finished_trips_can_be_deleted() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let done = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 1, 2))
        .await
        .unwrap();
    s.trips
        .transition_status(&driver, done.id, TripStatus::InProgress)
        .await
        .unwrap();
    s.trips
        .transition_status(&driver, done.id, TripStatus::Completed)
        .await
        .unwrap();
    let planned = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 5, 6))
        .await
        .unwrap();

    assert!(matches!(
        s.vehicles.delete_vehicle(&admin, truck.id).await,
        Err(AppError::InvalidTransition(_))
    ));

    s.trips
        .transition_status(&admin, planned.id, TripStatus::Cancelled)
        .await
        .unwrap();
    s.vehicles.delete_vehicle(&admin, truck.id).await.unwrap();

    assert!(matches!(
        s.vehicles.get_vehicle(truck.id).await,
        Err(AppError::VehicleNotFound(_))
    ));
    let history = s.trips.get_trip(&admin, done.id).await.unwrap();
    assert_eq!(history.truck_id, truck.id);
    assert_eq!(history.status, TripStatus::Completed);
}

#[tokio::test]
async fn test_end_odometer_must_exceed_start_odometer() {
    let s = services();
    let admin = admin();
    let driver = Actor::driver(Uuid::new_v4());
    let truck = register(&s, VehicleKind::Truck, 1_000).await;
    let trip = s
        .trips
        .create_trip(&admin, trip_request(truck.id, driver.user_id, 1, 2))
        .await
        .unwrap();

    for (end, fuel) in [(900, None), (1_000, Some(20.0))] {
        let err = s
            .trips
            .update_trip_data(
                &driver,
                trip.id,
                TripDataUpdate {
                    end_odometer: Some(end),
                    fuel_used: fuel,
                    ..TripDataUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidOdometerRange { start: 1_000, end: e } if e == end
        ));

        let stored = s.trips.get_trip(&admin, trip.id).await.unwrap();
        assert_eq!(stored, trip);
        assert_eq!(
            s.vehicles.get_vehicle(truck.id).await.unwrap().current_odometer,
            1_000
        );
    }
}
