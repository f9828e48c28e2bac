mod common;

use common::{assert_close, at, default_allocator, default_impact, session};
use ev_invoice::billing::{ChargingSession, Invoice, SessionAllocator};
use ev_invoice::config::BillingConfig;
use ev_invoice::error::BillingError;
use ev_invoice::tariff::{TariffSchedule, TimeOfDayBands};

#[test]
fn one_hour_from_midnight_splits_54_6() {
    let alloc = default_allocator();
    let s = session(at(2025, 8, 5, 0, 0, 0), 60, 5.0);
    let b = alloc.cost(&s).unwrap();

    assert_close(b.off_peak_kwh, 4.5);
    assert_close(b.peak_kwh, 0.5);
    assert_close(b.amount_before_tax, 4.5 * 0.1635 + 0.5 * 0.2081);
}

#[test]
fn band_split_always_sums_to_delivered_energy() {
    let alloc = default_allocator();
    let starts = [
        at(2025, 8, 1, 0, 0, 0),
        at(2025, 8, 1, 5, 59, 17),
        at(2025, 8, 1, 14, 30, 0),
        at(2025, 8, 1, 23, 45, 42),
    ];
    for start in starts {
        for (secs, kwh) in [(1_u64, 0.01), (59, 0.3), (3_725, 11.0), (50_000, 61.7)] {
            let s = ChargingSession::new(start, secs, kwh).unwrap();
            let b = alloc.cost(&s).unwrap();
            let sum = b.off_peak_kwh + b.peak_kwh;
            assert!(
                (sum - kwh).abs() <= 1e-9 * kwh,
                "start={start} secs={secs}: {sum} != {kwh}"
            );
            assert_close(b.total_kwh, sum);
        }
    }
}

#[test]
fn sessions_fully_inside_one_band() {
    let alloc = default_allocator();

    let night = alloc.cost(&session(at(2025, 8, 5, 1, 0, 0), 60, 6.0)).unwrap();
    assert_close(night.off_peak_kwh, 6.0);
    assert_close(night.peak_kwh, 0.0);

    let morning = alloc.cost(&session(at(2025, 8, 5, 10, 0, 0), 60, 6.0)).unwrap();
    assert_close(morning.off_peak_kwh, 0.0);
    assert_close(morning.peak_kwh, 6.0);
}

#[test]
fn empty_sessions_cost_nothing_even_before_the_schedule() {
    let alloc = default_allocator();
    let no_energy = ChargingSession::new(at(2025, 8, 5, 10, 0, 0), 3600, 0.0).unwrap();
    let no_time = ChargingSession::new(at(2019, 1, 1, 10, 0, 0), 0, 4.0).unwrap();

    for s in [no_energy, no_time] {
        let b = alloc.cost(&s).unwrap();
        assert_eq!(
            (b.off_peak_kwh, b.peak_kwh, b.amount_before_tax),
            (0.0, 0.0, 0.0)
        );
    }
}

#[test]
fn rate_is_fixed_by_start_date_across_cutover() {
    let alloc = default_allocator();
    let s = session(at(2025, 7, 31, 23, 0, 0), 120, 10.0);
    let a = alloc.allocate(&s).unwrap();
    let rate = a.rate.unwrap();

    assert_close(rate.off_peak, 0.1696);
    assert_close(rate.peak, 0.2146);
    // 23:00-00:05 peak (66 min), 00:06-00:59 off-peak (54 min).
    assert_close(a.breakdown.peak_kwh, 10.0 * 66.0 / 120.0);
    assert_close(a.breakdown.off_peak_kwh, 10.0 * 54.0 / 120.0);
}

#[test]
fn session_before_schedule_fails_the_batch() {
    let sessions = vec![
        session(at(2025, 8, 5, 1, 0, 0), 60, 5.0),
        session(at(2023, 12, 31, 1, 0, 0), 60, 5.0),
    ];
    let err = Invoice::build(&sessions, &default_allocator(), &default_impact()).unwrap_err();
    assert!(matches!(err, BillingError::ScheduleGap { .. }), "{err}");
}

#[test]
fn empty_batch_gives_zero_totals() {
    let invoice = Invoice::build(&[], &default_allocator(), &default_impact()).unwrap();
    assert!(invoice.is_empty());
    assert_eq!(invoice.totals.energy.total_kwh, 0.0);
    assert_eq!(invoice.totals.energy.amount_before_tax, 0.0);
    assert_eq!(invoice.totals.tax, 0.0);
    assert_eq!(invoice.totals.total_incl_tax, 0.0);
    assert_eq!(invoice.totals.impact.tree_equivalent, 0);
}

#[test]
fn tax_inclusive_flag_round_trips_through_tax() {
    let sessions = vec![
        session(at(2025, 8, 5, 0, 0, 0), 60, 5.0),
        session(at(2025, 8, 6, 16, 30, 0), 90, 9.0),
    ];
    let tax = 0.20;
    let exclusive =
        SessionAllocator::new(TariffSchedule::reference(), TimeOfDayBands::standard(), tax);
    let inclusive = SessionAllocator::new(
        TariffSchedule::reference().with_prices_include_tax(true),
        TimeOfDayBands::standard(),
        tax,
    );

    let ht = Invoice::build(&sessions, &exclusive, &default_impact()).unwrap();
    let ttc = Invoice::build(&sessions, &inclusive, &default_impact()).unwrap();

    assert_close(
        ttc.totals.energy.amount_before_tax,
        ht.totals.energy.amount_before_tax / (1.0 + tax),
    );
    // Re-applying tax to the inclusive reading gives back the stored prices.
    assert_close(ttc.totals.total_incl_tax, ht.totals.energy.amount_before_tax);
}

#[test]
fn configured_future_rate_applies_without_code_change() {
    let config = BillingConfig::from_toml_str(
        r#"
[tariff]
rates = [
  { effective = "2024-01-01", off_peak = 0.1696, peak = 0.2146 },
  { effective = "2025-08-01", off_peak = 0.1635, peak = 0.2081 },
  { effective = "2026-02-01", off_peak = 0.1500, peak = 0.2000 },
]
"#,
    )
    .unwrap();
    let alloc = config.allocator().unwrap();

    let before = alloc.cost(&session(at(2026, 1, 31, 10, 0, 0), 60, 1.0)).unwrap();
    let after = alloc.cost(&session(at(2026, 2, 1, 10, 0, 0), 60, 1.0)).unwrap();
    assert_close(before.amount_before_tax, 0.2081);
    assert_close(after.amount_before_tax, 0.2000);
}

#[test]
fn impact_depends_only_on_total_energy() {
    let a = vec![session(at(2025, 8, 5, 1, 0, 0), 60, 16.5)];
    let b = vec![
        session(at(2025, 8, 7, 10, 0, 0), 30, 10.0),
        session(at(2025, 8, 9, 16, 0, 0), 30, 6.5),
    ];
    let ia = Invoice::build(&a, &default_allocator(), &default_impact()).unwrap();
    let ib = Invoice::build(&b, &default_allocator(), &default_impact()).unwrap();

    assert_close(ia.totals.impact.distance_km, ib.totals.impact.distance_km);
    assert_close(ia.totals.impact.co2_avoided_kg, ib.totals.impact.co2_avoided_kg);
    assert_eq!(ia.totals.impact.tree_equivalent, ib.totals.impact.tree_equivalent);
    assert!((ia.totals.impact.distance_km - 100.0).abs() < 1e-6);
}
