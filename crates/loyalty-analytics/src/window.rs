//! Calendar-month windows anchored to a single captured "now".

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::types::{Agent, Member};

/// The instant a run started. Every window in the run derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    now: DateTime<Utc>,
}

impl RunClock {
    pub fn capture() -> Self {
        Self { now: Utc::now() }
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn current_month(&self) -> MonthWindow {
        MonthWindow::containing(self.now)
    }
}

/// Closed interval `[first instant, last millisecond]` of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day 1 exists for every month chrono can represent.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        first_of_month(date.year() + 1, 1)
    } else {
        first_of_month(date.year(), date.month() + 1)
    }
}

impl MonthWindow {
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let first = first_of_month(instant.year(), instant.month());
        Self::from_first_day(first)
    }

    fn from_first_day(first: NaiveDate) -> Self {
        let start = first.and_time(chrono::NaiveTime::MIN).and_utc();
        let next = next_month(first).and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            start,
            end: next - Duration::milliseconds(1),
        }
    }

    /// The calendar month before this one.
    pub fn previous(&self) -> Self {
        let first = self.start.date_naive();
        let prev = if first.month() == 1 {
            first_of_month(first.year() - 1, 12)
        } else {
            first_of_month(first.year(), first.month() - 1)
        };
        Self::from_first_day(prev)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// e.g. "October 2026"
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

/// Keep the items whose timestamp (preferred, else fallback) lies in `window`.
pub fn filter_to_month<T, P, F>(items: &[T], window: &MonthWindow, preferred: P, fallback: F) -> Vec<T>
where
    T: Clone,
    P: Fn(&T) -> Option<DateTime<Utc>>,
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    items
        .iter()
        .filter(|item| {
            preferred(item)
                .or_else(|| fallback(item))
                .is_some_and(|ts| window.contains(ts))
        })
        .cloned()
        .collect()
}

/// Restrict to the month containing the run's captured "now".
pub fn filter_to_current_month<T, P, F>(items: &[T], clock: &RunClock, preferred: P, fallback: F) -> Vec<T>
where
    T: Clone,
    P: Fn(&T) -> Option<DateTime<Utc>>,
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    filter_to_month(items, &clock.current_month(), preferred, fallback)
}

pub fn member_timestamp(m: &Member) -> Option<DateTime<Utc>> {
    m.created_at
}

pub fn agent_joined(a: &Agent) -> Option<DateTime<Utc>> {
    a.joined_at
}

pub fn agent_created(a: &Agent) -> Option<DateTime<Utc>> {
    a.created_at
}

pub fn members_in(members: &[Member], window: &MonthWindow) -> Vec<Member> {
    filter_to_month(members, window, member_timestamp, |_| None)
}

pub fn agents_in(agents: &[Agent], window: &MonthWindow) -> Vec<Agent> {
    filter_to_month(agents, window, agent_joined, agent_created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn member(id: &str, created: Option<DateTime<Utc>>) -> Member {
        Member {
            id: id.into(),
            created_at: created,
            ..Default::default()
        }
    }

    #[test]
    fn window_bounds_are_closed() {
        let w = MonthWindow::containing(at(2026, 10, 16, 12, 0, 0));
        assert_eq!(w.start, at(2026, 10, 1, 0, 0, 0));
        assert_eq!(w.end, at(2026, 11, 1, 0, 0, 0) - Duration::milliseconds(1));
        assert!(w.contains(w.start));
        assert!(w.contains(w.end));
        assert!(!w.contains(at(2026, 11, 1, 0, 0, 0)));
        assert!(!w.contains(w.start - Duration::milliseconds(1)));
        assert_eq!(w.label(), "October 2026");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let w = MonthWindow::containing(at(2026, 12, 31, 23, 59, 59));
        assert_eq!(w.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert!(w.contains(at(2026, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn previous_month_crosses_year_boundary() {
        let jan = MonthWindow::containing(at(2027, 1, 10, 0, 0, 0));
        let dec = jan.previous();
        assert_eq!(dec.first_day(), NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn leap_february() {
        let feb = MonthWindow::containing(at(2028, 2, 10, 0, 0, 0));
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
    }

    #[test]
    fn filter_keeps_only_current_month() {
        let clock = RunClock::at(at(2026, 10, 16, 8, 0, 0));
        let members = vec![
            member("in", Some(at(2026, 10, 1, 0, 0, 0))),
            member("before", Some(at(2026, 9, 30, 23, 59, 59))),
            member("after", Some(at(2026, 11, 1, 0, 0, 0))),
            member("none", None),
        ];
        let kept = filter_to_current_month(&members, &clock, member_timestamp, |_| None);
        let ids: Vec<_> = kept.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["in"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let clock = RunClock::at(at(2026, 10, 16, 8, 0, 0));
        let members = vec![
            member("a", Some(at(2026, 10, 2, 0, 0, 0))),
            member("b", Some(at(2026, 8, 2, 0, 0, 0))),
            member("c", Some(at(2026, 10, 31, 23, 0, 0))),
        ];
        let once = filter_to_current_month(&members, &clock, member_timestamp, |_| None);
        let twice = filter_to_current_month(&once, &clock, member_timestamp, |_| None);
        let ids = |v: &[Member]| v.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn agents_fall_back_to_created_at() {
        let window = MonthWindow::containing(at(2026, 10, 16, 0, 0, 0));
        let agents = vec![
            Agent {
                id: "joined-earlier".into(),
                joined_at: Some(at(2026, 9, 1, 0, 0, 0)),
                created_at: Some(at(2026, 10, 2, 0, 0, 0)),
                ..Default::default()
            },
            Agent {
                id: "created-now".into(),
                joined_at: None,
                created_at: Some(at(2026, 10, 2, 0, 0, 0)),
                ..Default::default()
            },
        ];
        let kept = agents_in(&agents, &window);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "created-now");
    }
}
