use crate::lobby::LobbyStats;
use crate::models::LeaderboardEntry;
use maud::{html, Markup, DOCTYPE};

pub struct Render {}

impl Render {
    fn page(title: &str, body: Markup) -> String {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (title) }
                    link rel="stylesheet" href="/static/style.css";
                }
                body {
                    (body)
                }
            }
        }
        .into_string()
    }

    /// Client shell. The game itself runs over `/ws`.
    pub fn root() -> String {
        Self::page(
            "Word Rush",
            html! {
                h1 { "Word Rush" }
                div id="app" data-ws="/ws" {
                    div id="auth" {}
                    div id="lobby" {}
                    div id="game-timer" {}
                    div id="game-board" {}
                    div id="word-input" {}
                    div id="valid-words" {}
                    div id="chat" {}
                }
                p { a href="/leaderboard" { "Leaderboard" } }
                script src="/static/app.js" {}
            },
        )
    }

    pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
        Self::page(
            "Word Rush leaderboard",
            html! {
                h1 { "Leaderboard" }
                @if entries.is_empty() {
                    p { "No ranked players yet." }
                } @else {
                    table id="leaderboard" {
                        thead {
                            tr { th { "#" } th { "Player" } th { "LP" } th { "Rank" } }
                        }
                        tbody {
                            @for (position, entry) in entries.iter().enumerate() {
                                tr {
                                    td { (position + 1) }
                                    td { (entry.username) }
                                    td { (entry.lp) }
                                    td {
                                        span class=(entry.rank.badge) { (entry.rank.label) }
                                    }
                                }
                            }
                        }
                    }
                }
                p { a href="/" { "Back to the game" } }
            },
        )
    }

    pub fn status(stats: &LobbyStats) -> String {
        Self::page(
            "Word Rush status",
            html! {
                h1 { "Status" }
                dl {
                    dt { "Online" } dd { (stats.online) }
                    dt { "Rooms" } dd { (stats.rooms) }
                    dt { "Ranked queue" } dd { (stats.ranked_queue) }
                    dt { "Quick queue" } dd { (stats.quick_queue) }
                }
            },
        )
    }
}
