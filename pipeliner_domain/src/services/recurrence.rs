// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Recurrence Calculator
//!
//! A pure, deterministic, UTC-only function computing the next scheduled run
//! time from a pipeline's recurrence and its run history. Equal inputs always
//! produce equal outputs; the function performs no I/O and reads no clock
//! itself (`now` is passed in).

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::entities::RunFrequency;

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap()
}

fn weekday_index(dt: DateTime<Utc>) -> i64 {
    dt.date_naive().weekday().num_days_from_monday() as i64
}

/// Computes the next run time for `frequency`, given an optional `last_run`
/// and the current instant `now`. Every branch anchors its target period on
/// `now`, not on `last_run` — `last_run` only decides whether the current
/// period has already been used and the target must advance to the next
/// one. The result is always strictly after `now`.
pub fn calculate_next_run(
    frequency: RunFrequency,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match frequency {
        RunFrequency::Daily => daily(last_run, now),
        RunFrequency::Weekly => weekly(last_run, now),
        RunFrequency::Monthly => monthly(last_run, now),
    }
}

fn daily(last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut target_date = now.date_naive();
    if let Some(lr) = last_run {
        if lr.date_naive() >= target_date {
            target_date += Duration::days(1);
        }
    }

    let target = midnight_utc(target_date);
    if target <= now {
        midnight_utc(target_date + Duration::days(1))
    } else {
        target
    }
}

fn weekly(last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let this_monday = now.date_naive() - Duration::days(weekday_index(now));
    let mut target_date = this_monday;
    if let Some(lr) = last_run {
        let last_run_monday = lr.date_naive() - Duration::days(weekday_index(lr));
        if last_run_monday >= this_monday {
            target_date += Duration::days(7);
        }
    }

    let target = midnight_utc(target_date);
    if target <= now {
        midnight_utc(target_date + Duration::days(7))
    } else {
        target
    }
}

fn monthly(last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let this_month_start = first_of_month(now.date_naive());
    let mut target_date = this_month_start;
    if let Some(lr) = last_run {
        let last_run_month_start = first_of_month(lr.date_naive());
        if last_run_month_start >= this_month_start {
            target_date = next_month(target_date);
        }
    }

    let target = midnight_utc(target_date);
    if target <= now {
        midnight_utc(next_month(target_date))
    } else {
        target
    }
}
