mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::{admin, register, services};
use fleet_manager::models::{
    MaintenanceCompletion, MaintenanceStatus, MaintenanceType, NewMaintenance, NewVehicle,
    Urgency, VehicleKind, VehicleStatus,
};
use fleet_manager::repositories::MaintenanceFilter;
use fleet_manager::services::FleetEvent;
use fleet_manager::utils::errors::AppError;

fn obligations_of(target_id: uuid::Uuid) -> MaintenanceFilter {
    MaintenanceFilter {
        target_id: Some(target_id),
        ..MaintenanceFilter::default()
    }
}

#[tokio::test]
async fn test_odometer_never_moves_backwards() {
    let s = services();
    let truck = register(&s, VehicleKind::Truck, 0).await;

    let after_first = s.scheduler.record_odometer(truck.id, 500).await.unwrap().vehicle;
    assert_eq!(after_first.current_odometer, 500);

    let err = s.scheduler.record_odometer(truck.id, 400).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOdometer(_)));

    let stored = s.vehicles.get_vehicle(truck.id).await.unwrap();
    assert_eq!(stored, after_first);
}

#[tokio::test]
async fn test_oil_change_scheduled_once_at_interval() {
    let s = services();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let mut events = s.events.subscribe();

    let update = s.scheduler.record_odometer(truck.id, 10_000).await.unwrap();
    assert_eq!(update.vehicle.status, VehicleStatus::Maintenance);
    assert_eq!(
        update.vehicle.watermarks.as_ref().unwrap().last_oil_change_odometer,
        10_000
    );
    let obligation = update.obligation.expect("oil change should be scheduled");
    assert_eq!(obligation.maintenance_type, MaintenanceType::OilChange);
    assert_eq!(obligation.status, MaintenanceStatus::Scheduled);
    assert_eq!(obligation.target_id, truck.id);

    let again = s.scheduler.record_odometer(truck.id, 10_500).await.unwrap();
    assert!(again.obligation.is_none());
    assert_eq!(again.vehicle.current_odometer, 10_500);

    let all = s.maintenance.list_maintenance(&obligations_of(truck.id)).await.unwrap();
    assert_eq!(all.len(), 1);

    match events.try_recv().unwrap() {
        FleetEvent::MaintenanceScheduled { obligation_id, automatic, .. } => {
            assert_eq!(obligation_id, obligation.id);
            assert!(automatic);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_trailers_are_never_auto_scheduled() {
    let s = services();
    let trailer = register(&s, VehicleKind::Trailer, 0).await;

    let update = s.scheduler.record_odometer(trailer.id, 50_000).await.unwrap();
    assert!(update.obligation.is_none());
    assert_eq!(update.vehicle.status, VehicleStatus::Available);
    assert!(s.scheduler.check_maintenance_needed(trailer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vehicle_in_maintenance_cannot_be_dispatched() {
    let s = services();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    s.vehicles
        .set_status(truck.id, VehicleStatus::Maintenance)
        .await
        .unwrap();

    let err = s
        .vehicles
        .set_status(truck.id, VehicleStatus::InUse)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Maintenance
    );
}

#[tokio::test]
async fn test_completion_resets_watermarks_and_frees_vehicle() {
    let s = services();
    let admin = admin();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    s.scheduler.record_odometer(truck.id, 4_000).await.unwrap();

    let obligation = s
        .maintenance
        .schedule_maintenance(
            &admin,
            NewMaintenance {
                target_id: truck.id,
                maintenance_type: MaintenanceType::OilChange,
                scheduled_date: Utc::now() - Duration::hours(1),
                cost: None,
                notes: Some("Vidange".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Maintenance
    );

    let started = s.maintenance.start_maintenance(&admin, obligation.id).await.unwrap();
    assert_eq!(started.status, MaintenanceStatus::InProgress);

    let completed = s
        .maintenance
        .complete_maintenance(
            &admin,
            obligation.id,
            MaintenanceCompletion {
                odometer: Some(4_200),
                ..MaintenanceCompletion::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, MaintenanceStatus::Completed);
    assert!(completed.completed_date.is_some());

    let truck = s.vehicles.get_vehicle(truck.id).await.unwrap();
    assert_eq!(truck.status, VehicleStatus::Available);
    assert_eq!(truck.current_odometer, 4_200);
    assert_eq!(truck.watermarks.unwrap().last_oil_change_odometer, 4_200);

    let err = s
        .maintenance
        .complete_maintenance(&admin, obligation.id, MaintenanceCompletion::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_cancel_keeps_vehicle_blocked_while_other_obligations_remain() {
    let s = services();
    let admin = admin();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let overdue = |maintenance_type| NewMaintenance {
        target_id: truck.id,
        maintenance_type,
        scheduled_date: Utc::now() - Duration::minutes(5),
        cost: None,
        notes: None,
    };

    let tires = s
        .maintenance
        .schedule_maintenance(&admin, overdue(MaintenanceType::TireReplacement))
        .await
        .unwrap();
    let inspection = s
        .maintenance
        .schedule_maintenance(&admin, overdue(MaintenanceType::Inspection))
        .await
        .unwrap();

    s.maintenance.cancel_maintenance(&admin, tires.id).await.unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Maintenance
    );

    s.maintenance.cancel_maintenance(&admin, inspection.id).await.unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Available
    );
}

#[tokio::test]
async fn test_completion_keeps_vehicle_blocked_while_other_work_in_progress() {
    let s = services();
    let admin = admin();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let in_days = |maintenance_type, days| NewMaintenance {
        target_id: truck.id,
        maintenance_type,
        scheduled_date: Utc::now() + Duration::days(days),
        cost: None,
        notes: None,
    };

    let oil = s
        .maintenance
        .schedule_maintenance(&admin, in_days(MaintenanceType::OilChange, 2))
        .await
        .unwrap();
    let tires = s
        .maintenance
        .schedule_maintenance(&admin, in_days(MaintenanceType::TireReplacement, 2))
        .await
        .unwrap();
    s.maintenance
        .schedule_maintenance(&admin, in_days(MaintenanceType::Inspection, 20))
        .await
        .unwrap();
    s.maintenance.start_maintenance(&admin, oil.id).await.unwrap();
    s.maintenance.start_maintenance(&admin, tires.id).await.unwrap();

    s.maintenance
        .complete_maintenance(&admin, oil.id, MaintenanceCompletion::default())
        .await
        .unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Maintenance
    );

    s.maintenance
        .complete_maintenance(&admin, tires.id, MaintenanceCompletion::default())
        .await
        .unwrap();
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Available
    );
}

#[tokio::test]
async fn test_upcoming_lists_scheduled_obligations_in_horizon() {
    let s = services();
    let admin = admin();
    let truck = register(&s, VehicleKind::Truck, 0).await;
    let future = |days| NewMaintenance {
        target_id: truck.id,
        maintenance_type: MaintenanceType::Other,
        scheduled_date: Utc::now() + Duration::days(days),
        cost: None,
        notes: None,
    };

    let soon = s.maintenance.schedule_maintenance(&admin, future(3)).await.unwrap();
    s.maintenance.schedule_maintenance(&admin, future(60)).await.unwrap();

    let upcoming = s.maintenance.upcoming_maintenance(30).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, soon.id);
    assert_eq!(
        s.vehicles.get_vehicle(truck.id).await.unwrap().status,
        VehicleStatus::Available
    );
}

#[tokio::test]
async fn test_alert_report_uses_its_own_thresholds() {
    let s = services();
    let stale = s
        .vehicles
        .register_vehicle(
            &admin(),
            NewVehicle {
                kind: VehicleKind::Truck,
                plate: "ab-123-cd".to_string(),
                brand: "Renault".to_string(),
                model: "T480".to_string(),
                initial_odometer: 0,
                current_odometer: None,
                acquired_at: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
                last_oil_change_date: Some(Utc::now() - Duration::days(200)),
                last_inspection_date: Some(Utc::now() - Duration::days(410)),
            },
        )
        .await
        .unwrap();
    assert_eq!(stale.plate, "AB-123-CD");
    register(&s, VehicleKind::Truck, 0).await;

    let alerts = s.scheduler.check_maintenance_needed(stale.id).await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].maintenance_type, MaintenanceType::OilChange);
    assert_eq!(alerts[0].urgency, Urgency::Medium);
    assert_eq!(alerts[1].maintenance_type, MaintenanceType::Inspection);
    assert_eq!(alerts[1].urgency, Urgency::High);

    let reports = s.scheduler.vehicles_needing_maintenance().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].vehicle.id, stale.id);
}
