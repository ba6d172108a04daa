use crate::streaks::{CheckinOutcome, OutcomeKind};
use serenity::{
    builder::{
        CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseMessage,
    },
    model::{application::ButtonStyle, Timestamp},
};

pub const CHECKIN_BUTTON_ID: &str = "checkins";

const TITLE: &str = "ログインキャンペーン";
const NO_REWARDS: &str = "まだ報酬は獲得されていません。";

pub fn ephemeral_response(message: &str) -> CreateInteractionResponse {
    let data = CreateInteractionResponseMessage::new()
        .content(message)
        .ephemeral(true);
    CreateInteractionResponse::Message(data)
}

pub fn outcome_description(outcome: &CheckinOutcome, grace_days: i64) -> String {
    match outcome.kind {
        OutcomeKind::Created | OutcomeKind::Continued => {
            format!("✅ {} さん、チェックイン成功しました！", outcome.username)
        }
        OutcomeKind::AlreadyCheckedIn => format!(
            "⏳ {} さん、本日はすでにチェックイン済みです。明日またお試しください。",
            outcome.username
        ),
        OutcomeKind::Reset { previous_streak } => format!(
            "🔄 {} さん、{}日間チェックインがされていなかったため、累計チェックイン数は「1」にリセットされました。（前回: {} 日）",
            outcome.username, grace_days, previous_streak
        ),
    }
}

pub fn rewards_text(rewards: &[String]) -> String {
    if rewards.is_empty() {
        NO_REWARDS.to_string()
    } else {
        rewards.join(", ")
    }
}

pub fn checkin_embed(outcome: &CheckinOutcome, grace_days: i64, color: u32) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(TITLE)
        .colour(color)
        .description(outcome_description(outcome, grace_days))
        .field("累計ログイン日数", format!("`{}` 日", outcome.streak), false);

    if let Some(reward) = &outcome.granted {
        embed = embed.field("🎁 今回の報酬", format!("`{}`", reward), false);
    }

    embed
        .field("報酬", format!("```\n{}\n```", rewards_text(&outcome.rewards)), false)
        .timestamp(Timestamp::now())
}

pub fn failure_message(retryable: bool) -> &'static str {
    if retryable {
        "⚠️ 報酬の付与に失敗したため、チェックインは記録されていません。しばらくしてからもう一度お試しください。"
    } else {
        "⚠️ チェックイン中にエラーが発生しました。管理者にお問い合わせください。"
    }
}

pub fn cooldown_message(remaining_secs: u64) -> String {
    format!("⏳ {}秒後にもう一度お試しください。", remaining_secs.max(1))
}

pub fn panel_embed(color: u32) -> CreateEmbed {
    CreateEmbed::new()
        .title(TITLE)
        .colour(color)
        .description("毎日ボタンを押してチェックインし、連続ログイン報酬を獲得しましょう！")
}

pub fn panel_components() -> Vec<CreateActionRow> {
    let button = CreateButton::new(CHECKIN_BUTTON_ID)
        .label("チェックイン")
        .emoji('✅')
        .style(ButtonStyle::Primary);
    vec![CreateActionRow::Buttons(vec![button])]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: OutcomeKind) -> CheckinOutcome {
        CheckinOutcome {
            kind,
            username: "alice".to_string(),
            streak: 4,
            rewards: vec!["Gem".to_string(), "CODE-1".to_string()],
            granted: None,
        }
    }

    #[test]
    fn describes_each_outcome() {
        assert!(outcome_description(&outcome(OutcomeKind::Created), 5).starts_with("✅ alice"));
        assert!(outcome_description(&outcome(OutcomeKind::Continued), 5).contains("成功"));
        assert!(outcome_description(&outcome(OutcomeKind::AlreadyCheckedIn), 5).contains("すでに"));
        assert!(outcome_description(&outcome(OutcomeKind::Reset { previous_streak: 9 }), 5)
            .contains("前回: 9 日"));
    }

    #[test]
    fn lists_rewards_or_placeholder() {
        assert_eq!(rewards_text(&outcome(OutcomeKind::Created).rewards), "Gem, CODE-1");
        assert_eq!(rewards_text(&[]), NO_REWARDS);
    }

    #[test]
    fn cooldown_never_shows_zero_seconds() {
        assert_eq!(cooldown_message(0), "⏳ 1秒後にもう一度お試しください。");
    }
}
