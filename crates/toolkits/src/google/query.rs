use chrono::{Datelike, Duration, NaiveDate};
use tool_core::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
    ThisYear,
}

impl DateRange {
    pub const ALL: [DateRange; 7] = [
        DateRange::Today,
        DateRange::Yesterday,
        DateRange::Last7Days,
        DateRange::Last30Days,
        DateRange::ThisMonth,
        DateRange::LastMonth,
        DateRange::ThisYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::Last7Days => "last_7_days",
            DateRange::Last30Days => "last_30_days",
            DateRange::ThisMonth => "this_month",
            DateRange::LastMonth => "last_month",
            DateRange::ThisYear => "this_year",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(DateRange::as_str).collect()
    }

    pub fn parse(value: &str) -> Result<Self, ToolError> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|range| range.as_str() == value)
            .ok_or_else(|| {
                let valid = Self::names().join(", ");
                ToolError::retryable(format!("Invalid date range. Must be one of: {}", valid))
                    .with_developer_message(format!("date_range must be one of: {}", valid))
            })
    }

    /// Gmail `after:` filter relative to `today`.
    pub fn to_date_query(&self, today: NaiveDate) -> String {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let since = match self {
            DateRange::Today => today,
            DateRange::Yesterday => today - Duration::days(1),
            DateRange::Last7Days => today - Duration::days(7),
            DateRange::Last30Days => today - Duration::days(30),
            DateRange::ThisMonth => first_of_month,
            DateRange::LastMonth => {
                let last_of_previous = first_of_month - Duration::days(1);
                last_of_previous.with_day(1).unwrap_or(last_of_previous)
            }
            DateRange::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        format!("after:{}", since.format("%Y/%m/%d"))
    }
}

/// Header filters shared by the email and thread searches.
#[derive(Debug, Clone, Default)]
pub struct MailFilter {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub date_range: Option<DateRange>,
    pub label: Option<String>,
}

impl MailFilter {
    pub fn is_empty(&self) -> bool {
        self.sender.is_none()
            && self.recipient.is_none()
            && self.subject.is_none()
            && self.body.is_none()
            && self.date_range.is_none()
            && self.label.is_none()
    }

    /// Gmail search syntax, e.g. `from:ann subject:lunch after:2025/01/01`.
    pub fn to_query(&self, today: NaiveDate) -> String {
        let mut terms = Vec::new();
        if let Some(sender) = &self.sender {
            terms.push(format!("from:{}", sender));
        }
        if let Some(recipient) = &self.recipient {
            terms.push(format!("to:{}", recipient));
        }
        if let Some(subject) = &self.subject {
            terms.push(format!("subject:{}", subject));
        }
        if let Some(body) = &self.body {
            terms.push(body.clone());
        }
        if let Some(range) = &self.date_range {
            terms.push(range.to_date_query(today));
        }
        if let Some(label) = &self.label {
            terms.push(format!("label:{}", label));
        }
        terms.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_ranges() {
        let today = day(2025, 3, 15);
        assert_eq!(DateRange::Today.to_date_query(today), "after:2025/03/15");
        assert_eq!(DateRange::Yesterday.to_date_query(today), "after:2025/03/14");
        assert_eq!(DateRange::Last7Days.to_date_query(today), "after:2025/03/08");
        assert_eq!(DateRange::ThisMonth.to_date_query(today), "after:2025/03/01");
        assert_eq!(DateRange::LastMonth.to_date_query(today), "after:2025/02/01");
        assert_eq!(DateRange::ThisYear.to_date_query(today), "after:2025/01/01");
        assert_eq!(
            DateRange::LastMonth.to_date_query(day(2025, 1, 10)),
            "after:2024/12/01"
        );
    }

    #[test]
    fn test_parse_date_range() {
        assert_eq!(DateRange::parse("Last_7_Days").unwrap(), DateRange::Last7Days);
        let err = DateRange::parse("fortnight").unwrap_err();
        assert!(err.can_retry());
        assert!(err.to_string().starts_with("Invalid date range. Must be one of: today"));
    }

    #[test]
    fn test_query_order() {
        let filter = MailFilter {
            sender: Some("ann@example.com".into()),
            subject: Some("lunch".into()),
            body: Some("tacos".into()),
            date_range: Some(DateRange::Today),
            label: Some("Work".into()),
            ..Default::default()
        };
        assert_eq!(
            filter.to_query(day(2025, 3, 15)),
            "from:ann@example.com subject:lunch tacos after:2025/03/15 label:Work"
        );
        assert!(MailFilter::default().is_empty());
    }
}
