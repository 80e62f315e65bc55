/// Prompt template for `id`: `npfl`, `punch` or `bbc`.
pub fn template_for(id: &str) -> Option<&'static str> {
    match id {
        "npfl" => Some(NPFL_PROMPT),
        "punch" => Some(PUNCH_PROMPT),
        "bbc" => Some(BBC_PROMPT),
        _ => None,
    }
}

pub const PROMPT_IDS: &[&str] = &["npfl", "punch", "bbc"];

pub const NPFL_PROMPT: &str = r#"You are a sports betting analyst creating prediction markets from Nigerian football data.

CRAWLED CONTENT:
{corpus}

TODAY'S DATE: {current_date}

TASK: Find upcoming NPFL matches and create binary YES/NO prediction markets.

MARKET TYPES (vary your choices):
- Match winner: "Will [Team] beat [Opponent]?"
- Draw prediction: "Will [Team] vs [Opponent] end in a draw?"
- Over/under goals: "Will there be over 2.5 goals in [Match]?"
- Clean sheet: "Will [Team] keep a clean sheet?"
- Both teams to score: "Will both teams score in [Match]?"

TIMING RULES:
- betting_closes_at: 1 hour before kickoff (ISO 8601 format with Z suffix)
- resolves_at: 3 hours after kickoff (ISO 8601 format with Z suffix)

SOURCE URL RULE:
- source_url MUST be a specific page URL from the crawled content (look for "--- PAGE: URL ---" markers)
- Do NOT use generic homepage URLs

OUTPUT FORMAT: Return a JSON object with a "markets" array. No explanation, just JSON.

Example output:
{
  "markets": [
    {
      "question": "Will Enyimba beat Kano Pillars?",
      "description": "NPFL fixture at Aba Stadium. Enyimba are strong at home this season.",
      "source_url": "https://npfl.ng/fixtures",
      "category": "sports",
      "betting_closes_at": "2026-01-20T14:00:00Z",
      "resolves_at": "2026-01-20T18:00:00Z",
      "resolution_context": "Check final score on npfl.ng or livescore sites"
    }
  ]
}

Return {"markets": []} if no valid upcoming matches found."#;

pub const PUNCH_PROMPT: &str = r#"You are a prediction market analyst scanning Nigerian news for upcoming events.

CRAWLED NEWS CONTENT:
{corpus}

TODAY'S DATE: {current_date}

TASK: Find upcoming events with clear binary outcomes and create YES/NO prediction markets.

EVENT TYPES TO LOOK FOR:
- Sports: Match results, tournament winners, player transfers
- Entertainment: BBNaija evictions, award show winners (Headies, AMVCA), album/movie releases
- Politics: Election results, bill votes, government appointments
- Finance: Exchange rate milestones, inflation announcements, policy decisions
- Events: Conference outcomes, product launches, deadline-based announcements

RULES FOR GOOD MARKETS:
1. Question must be answerable with YES or NO
2. Outcome must be objectively verifiable
3. Event must have a specific date/time (or predictable timeframe)
4. Avoid vague or opinion-based questions
5. source_url MUST be a specific article URL from the crawled content (look for "--- PAGE: URL ---" markers), NOT a homepage or category page. Skip markets without a specific source article.

TIMING RULES:
- betting_closes_at: 1-2 hours before the event/announcement
- resolves_at: 2-4 hours after the event concludes

QUESTION FORMATS:
- "Will [Team] beat [Opponent] in [Match]?"
- "Will [Person] be evicted from BBNaija this week?"
- "Will [Artist] win [Category] at [Award Show]?"
- "Will [Bill/Policy] pass the [Senate/House]?"
- "Will NGN/USD exceed [X] by [Date]?"

OUTPUT FORMAT: Return a JSON object with a "markets" array.

Example:
{
  "markets": [
    {
      "question": "Will Wizkid win Artist of the Year at the 2026 Headies?",
      "description": "The Headies 2026 ceremony is scheduled for January 25th. Wizkid is nominated alongside Burna Boy and Davido.",
      "source_url": "https://punchng.com/...",
      "category": "entertainment",
      "betting_closes_at": "2026-01-25T17:00:00Z",
      "resolves_at": "2026-01-25T23:00:00Z",
      "resolution_context": "Check official Headies announcement or Punch Nigeria entertainment section"
    }
  ]
}

Return {"markets": []} if no valid upcoming events with clear binary outcomes are found.
Do NOT create markets for past events or events without specific timing."#;

pub const BBC_PROMPT: &str = r#"You are a prediction market analyst scanning African news.

CRAWLED NEWS CONTENT:
{corpus}

TODAY'S DATE: {current_date}

TASK: Find upcoming events and create binary YES/NO prediction markets.

LOOK FOR:
- Politics: Elections, policy decisions, diplomatic events
- Sports: Match results, tournament outcomes
- Economy: Currency movements, trade deals
- Society: Major events, cultural happenings

TIMING RULES:
- betting_closes_at: 1 hour before event
- resolves_at: 2 hours after event

SOURCE URL RULE:
- source_url MUST be a specific article URL from the crawled content (look for "--- PAGE: URL ---" markers)
- Do NOT use homepage or category URLs
- Skip markets if no specific source article exists

OUTPUT: JSON with "markets" array.
[
  {
    "question": "Will [specific outcome] happen by [date]?",
    "description": "Brief context about the event",
    "source_url": "URL from the crawled content",
    "category": "politics|sports|economy|society",
    "betting_closes_at": "2026-01-20T14:00:00Z",
    "resolves_at": "2026-01-20T18:00:00Z",
    "resolution_context": "Check BBC for official result"
  }
]
Return empty array [] if no valid upcoming events found.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_prompt_has_placeholders() {
        for id in PROMPT_IDS {
            let template = template_for(id).unwrap();
            assert!(template.contains("{corpus}"), "{} lacks corpus", id);
            assert!(template.contains("{current_date}"), "{} lacks date", id);
            assert!(!template.contains("{{"), "{} has doubled braces", id);
        }
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(template_for("reuters").is_none());
    }
}
