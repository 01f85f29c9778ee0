use crate::infra::{local_to_utc, seed_fleet};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Args;
use crew_booking::booking::{
    AvailabilityService, BookingApi, BookingRequest, BookingView, InMemoryScheduleStore,
    RescheduleRequest, VehicleAvailabilityView, VehicleDailyAvailabilityView,
};
use crew_booking::clock::FixedClock;
use crew_booking::config::{AppConfig, SchedulingConfig};
use crew_booking::error::AppError;
use crew_booking::scheduling::TimeSlot;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AvailabilityArgs {
    /// Date to inspect (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: NaiveDate,
    /// Window start (HH:MM). Prints the whole-day view when omitted.
    #[arg(long, value_parser = crate::infra::parse_time)]
    pub(crate) start: Option<NaiveTime>,
    /// Window length in minutes
    #[arg(long, default_value_t = 60)]
    pub(crate) duration: i64,
    /// Local "now" (YYYY-MM-DDTHH:MM). Defaults to the system clock.
    #[arg(long, value_parser = crate::infra::parse_local_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date to book (YYYY-MM-DD). Defaults to the next working day.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Local "now" (YYYY-MM-DDTHH:MM). Defaults to the system clock.
    #[arg(long, value_parser = crate::infra::parse_local_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
}

/// (start hour, start minute, duration, cleaners)
const SAMPLE_BOOKINGS: [(u32, u32, i64, i64); 7] = [
    (10, 0, 120, 3),
    (10, 30, 90, 2),
    (11, 0, 60, 5),
    (9, 0, 240, 5),
    (9, 30, 180, 5),
    (10, 0, 60, 5),
    (10, 15, 60, 5),
];

pub(crate) fn run_availability(args: AvailabilityArgs) -> Result<(), AppError> {
    let AvailabilityArgs {
        date,
        start,
        duration,
        now,
    } = args;

    let config = AppConfig::load()?;
    let scheduling = config.scheduling;
    let now = now.unwrap_or_else(|| local_now(&scheduling));

    let store = Arc::new(InMemoryScheduleStore::new());
    seed_fleet(&store)?;
    let clock = Arc::new(FixedClock(local_to_utc(now, &scheduling)));
    let service = AvailabilityService::new(store, clock, scheduling);

    match start {
        Some(start) => {
            let vehicles = service.window(date, start, duration)?;
            render_window(date, start, duration, &vehicles);
        }
        None => {
            let vehicles = service.daily(date)?;
            render_daily(date, &vehicles);
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, now } = args;

    let config = AppConfig::load()?;
    let scheduling = config.scheduling;
    let now = now.unwrap_or_else(|| local_now(&scheduling));
    let date = date.unwrap_or_else(|| next_working_day(now.date(), &scheduling));

    let store = Arc::new(InMemoryScheduleStore::new());
    seed_fleet(&store)?;
    let clock = Arc::new(FixedClock(local_to_utc(now, &scheduling)));
    let api = BookingApi::new(store, clock, scheduling);

    println!("Crew booking demo for {date} (now {})", now.format("%Y-%m-%d %H:%M"));
    println!(
        "Working hours {}-{} | {} min break | {} off | up to {} cleaners per booking",
        hm(scheduling.working_hours.start),
        hm(scheduling.working_hours.end),
        scheduling.break_minutes,
        scheduling.non_working_day,
        scheduling.max_cleaners_per_vehicle
    );

    println!("\nBooking requests");
    let mut booked = Vec::new();
    for (hour, minute, duration, cleaners) in SAMPLE_BOOKINGS {
        let Some(start) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            continue;
        };
        let request = BookingRequest {
            date,
            start_time: start,
            duration_minutes: duration,
            cleaner_count: cleaners,
        };
        match api.bookings.create(request) {
            Ok(view) => {
                render_booking(&view);
                booked.push(view);
            }
            Err(err) => println!(
                "- {} for {duration} min with {cleaners} cleaner(s) rejected: {err}",
                hm(start)
            ),
        }
    }

    if let Some(first) = booked.first() {
        let afternoon = NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(first.start_time);
        println!("\nRescheduling booking #{} to {}", first.booking_id, hm(afternoon));
        match api.bookings.reschedule(
            first.booking_id,
            RescheduleRequest {
                date,
                start_time: afternoon,
            },
        ) {
            Ok(view) => render_booking(&view),
            Err(err) => println!("- rejected: {err}"),
        }
    }

    if let Some(second) = booked.get(1) {
        println!("\nCancelling booking #{}", second.booking_id);
        match api.bookings.cancel(second.booking_id) {
            Ok(()) => println!("- cancelled"),
            Err(err) => println!("- rejected: {err}"),
        }
    }

    println!();
    match api.availability.daily(date) {
        Ok(vehicles) => render_daily(date, &vehicles),
        Err(err) => println!("Daily availability unavailable: {err}"),
    }

    if let Some(noon) = NaiveTime::from_hms_opt(12, 0, 0) {
        println!();
        match api.availability.window(date, noon, 60) {
            Ok(vehicles) => render_window(date, noon, 60, &vehicles),
            Err(err) => println!("Window availability unavailable: {err}"),
        }
    }

    Ok(())
}

fn local_now(config: &SchedulingConfig) -> NaiveDateTime {
    Utc::now().with_timezone(&config.timezone).naive_local()
}

/// First day after `today` that is not the configured day off.
pub(crate) fn next_working_day(today: NaiveDate, config: &SchedulingConfig) -> NaiveDate {
    let mut day = today;
    while let Some(next) = day.checked_add_days(Days::new(1)) {
        day = next;
        if config.is_working_day(day.weekday()) {
            break;
        }
    }
    day
}

fn render_booking(view: &BookingView) {
    let cleaners: Vec<&str> = view.cleaners.iter().map(|c| c.name.as_str()).collect();
    println!(
        "- #{} {} {}-{} {} [{}]: {}",
        view.booking_id,
        view.date,
        hm(view.start_time),
        hm(view.end_time),
        view.vehicle_name,
        view.status.label(),
        if cleaners.is_empty() {
            "no cleaners".to_string()
        } else {
            cleaners.join(", ")
        }
    );
}

pub(crate) fn render_daily(date: NaiveDate, vehicles: &[VehicleDailyAvailabilityView]) {
    println!("Availability on {date}");
    if vehicles.is_empty() {
        println!("- no cleaner has free time");
        return;
    }
    for vehicle in vehicles {
        println!("{} (#{})", vehicle.vehicle_name, vehicle.vehicle_id);
        for cleaner in &vehicle.cleaners {
            println!("  - {}: {}", cleaner.name, format_slots(&cleaner.time_slots));
        }
    }
}

pub(crate) fn render_window(
    date: NaiveDate,
    start: NaiveTime,
    duration: i64,
    vehicles: &[VehicleAvailabilityView],
) {
    println!("Cleaners free on {date} from {} for {duration} min", hm(start));
    if vehicles.is_empty() {
        println!("- none");
        return;
    }
    for vehicle in vehicles {
        let names: Vec<&str> = vehicle.cleaners.iter().map(|c| c.name.as_str()).collect();
        println!("- {}: {}", vehicle.vehicle_name, names.join(", "));
    }
}

pub(crate) fn format_slots(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .map(|slot| format!("{}-{}", hm(slot.start()), hm(slot.end())))
        .collect::<Vec<_>>()
        .join(", ")
}

fn hm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
