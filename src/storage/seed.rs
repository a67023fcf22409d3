//! Starter collection used when storage holds nothing yet.

use chrono::NaiveDate;

use crate::calendar::{self, Direction};
use crate::domain::{Loop, LoopKind, LoopStatus, Subtask, Tier};

struct SeedLoop<'a> {
    id: &'a str,
    tier: Tier,
    kind: LoopKind,
    recurring: bool,
    expired: bool,
    title: &'a str,
    color: &'a str,
    period: &'a str,
    linked_to: Option<&'a str>,
    rolled_from: Option<&'a str>,
    steps: &'a [(&'a str, &'a str, bool)],
}

impl SeedLoop<'_> {
    fn build(&self) -> Loop {
        Loop {
            id: self.id.to_string(),
            tier: self.tier,
            kind: self.kind,
            recurrence: self.recurring.then_some(self.tier),
            status: if self.expired {
                LoopStatus::Expired
            } else {
                LoopStatus::Active
            },
            title: self.title.to_string(),
            color: self.color.to_string(),
            period: self.period.to_string(),
            linked_to: self.linked_to.map(str::to_string),
            rolled_from: self.rolled_from.map(str::to_string),
            subtasks: self
                .steps
                .iter()
                .map(|(id, text, done)| Subtask {
                    id: id.to_string(),
                    text: text.to_string(),
                    done: *done,
                })
                .collect(),
        }
    }
}

/// Three monthly, four weekly and five daily loops placed around `today`.
///
/// Includes an expired weekly from last week, an expired daily from
/// yesterday, recurring dailies, and links across all three tiers.
pub fn build_seed(today: NaiveDate) -> Vec<Loop> {
    let day = calendar::day_key(today);
    let week = calendar::iso_week_key(today);
    let month = calendar::month_key(today);
    let yesterday = today.pred_opt().map(calendar::day_key).unwrap_or_else(|| day.clone());
    let last_week = calendar::neighbor(&week, Tier::Weekly, Direction::Prev).unwrap_or_else(|_| week.clone());

    use LoopKind::{Open, Windowed};
    use Tier::{Daily, Monthly, Weekly};

    let seeds = [
        SeedLoop {
            id: "m1",
            tier: Monthly,
            kind: Open,
            recurring: false,
            expired: false,
            title: "Ship side project",
            color: "#FF6B35",
            period: &month,
            linked_to: None,
            rolled_from: None,
            steps: &[
                ("a1", "Define MVP scope", true),
                ("a2", "Write landing page", false),
                ("a3", "Launch & share", false),
            ],
        },
        SeedLoop {
            id: "m2",
            tier: Monthly,
            kind: Open,
            recurring: false,
            expired: false,
            title: "Read 2 books",
            color: "#A78BFA",
            period: &month,
            linked_to: None,
            rolled_from: None,
            steps: &[("b1", "Finish Atomic Habits", false), ("b2", "Start Deep Work", false)],
        },
        SeedLoop {
            id: "m3",
            tier: Monthly,
            kind: Windowed,
            recurring: false,
            expired: false,
            title: "Gym streak this month",
            color: "#34D399",
            period: &month,
            linked_to: None,
            rolled_from: None,
            steps: &[("c1", "20 sessions logged", false)],
        },
        SeedLoop {
            id: "w_exp",
            tier: Weekly,
            kind: Windowed,
            recurring: false,
            expired: true,
            title: "Write project brief",
            color: "#FF6B35",
            period: &last_week,
            linked_to: Some("m1"),
            rolled_from: None,
            steps: &[("x1", "Draft outline", true), ("x2", "Share for feedback", false)],
        },
        SeedLoop {
            id: "w1",
            tier: Weekly,
            kind: Open,
            recurring: false,
            expired: false,
            title: "Build auth system",
            color: "#FF6B35",
            period: &week,
            linked_to: Some("m1"),
            rolled_from: Some(last_week.as_str()),
            steps: &[
                ("d1", "Set up Supabase", true),
                ("d2", "Login flow", false),
                ("d3", "Protect routes", false),
            ],
        },
        SeedLoop {
            id: "w2",
            tier: Weekly,
            kind: Open,
            recurring: false,
            expired: false,
            title: "Read chapters 5-8",
            color: "#A78BFA",
            period: &week,
            linked_to: Some("m2"),
            rolled_from: None,
            steps: &[
                ("e1", "Read ch. 5-6", true),
                ("e2", "Read ch. 7-8", false),
                ("e3", "Take notes", false),
            ],
        },
        SeedLoop {
            id: "w3",
            tier: Weekly,
            kind: Windowed,
            recurring: true,
            expired: false,
            title: "Gym 3x this week",
            color: "#34D399",
            period: &week,
            linked_to: Some("m3"),
            rolled_from: None,
            steps: &[
                ("f1", "Monday session", true),
                ("f2", "Wednesday session", true),
                ("f3", "Friday session", false),
            ],
        },
        SeedLoop {
            id: "dy_exp",
            tier: Daily,
            kind: Windowed,
            recurring: false,
            expired: true,
            title: "Evening reflection",
            color: "#FBBF24",
            period: &yesterday,
            linked_to: None,
            rolled_from: None,
            steps: &[("k1", "Journal 5 mins", false), ("k2", "Set tomorrow focus", false)],
        },
        SeedLoop {
            id: "d1",
            tier: Daily,
            kind: Open,
            recurring: false,
            expired: false,
            title: "Build login endpoint",
            color: "#FF6B35",
            period: &day,
            linked_to: Some("w1"),
            rolled_from: None,
            steps: &[
                ("g1", "Write route handler", true),
                ("g2", "Add JWT", false),
                ("g3", "Write tests", false),
            ],
        },
        SeedLoop {
            id: "d2",
            tier: Daily,
            kind: Windowed,
            recurring: true,
            expired: false,
            title: "Morning deep work",
            color: "#60A5FA",
            period: &day,
            linked_to: None,
            rolled_from: None,
            steps: &[("h1", "No phone first hour", true), ("h2", "Single-task focus", true)],
        },
        SeedLoop {
            id: "d3",
            tier: Daily,
            kind: Windowed,
            recurring: true,
            expired: false,
            title: "Read 20 pages",
            color: "#A78BFA",
            period: &day,
            linked_to: Some("w2"),
            rolled_from: None,
            steps: &[("i1", "Read on lunch", false), ("i2", "Highlight ideas", false)],
        },
        SeedLoop {
            id: "d4",
            tier: Daily,
            kind: Windowed,
            recurring: true,
            expired: false,
            title: "Evening reflection",
            color: "#FBBF24",
            period: &day,
            linked_to: None,
            rolled_from: None,
            steps: &[("j1", "Journal 5 mins", false), ("j2", "Set tomorrow focus", false)],
        },
    ];

    seeds.iter().map(SeedLoop::build).collect()
}
