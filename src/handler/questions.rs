use crate::{
    error::BotResult,
    service::dialogue::model::{Action, StateTag},
    storage::model::QuestionStats,
    utils::{format_time, percent},
};

use super::{
    dispatch::{now, Outcome, Turn},
    keyboard::{get_back_keyboard, get_confirm_keyboard, get_questions_handle_keyboard, get_questions_view_keyboard},
};

pub async fn handle_callback_handle_questions(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("questions.handle.mode_choice", locale = locale),
            Some(get_questions_handle_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::HandleQuestions,
        anchor,
    })
}

pub async fn handle_callback_clear_questions_request(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("questions.handle.clear_confirmation_request", locale = locale),
            Some(get_confirm_keyboard(
                locale,
                Action::ClearQuestionsConfirm,
                Action::HandleQuestions,
            )),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ClearQuestionsRequest,
        anchor,
    })
}

pub async fn handle_callback_clear_questions_confirm(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    turn.app.records.clear_questions().await?;
    warn!("All questions cleared by {}", turn.session.identity);

    turn.present(t!("questions.handle.cleared_confirmation", locale = turn.locale()), None)
        .await;
    Ok(Outcome::FinishBelow)
}

pub async fn handle_callback_view_questions(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("questions.view.mode_choice", locale = locale),
            Some(get_questions_view_keyboard(locale)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ViewQuestions,
        anchor,
    })
}

fn render_statistics(stats: &QuestionStats, locale: &str) -> String {
    let mut lines = vec![
        t!("questions.view.total_count", locale = locale, number = stats.total).to_string(),
        t!(
            "questions.view.unanswered_count",
            locale = locale,
            number = stats.unanswered,
            percent = percent(stats.unanswered, stats.total)
        )
        .to_string(),
        t!(
            "questions.view.reserved_count",
            locale = locale,
            number = stats.reserved,
            percent = percent(stats.reserved, stats.total)
        )
        .to_string(),
        t!(
            "questions.view.answered_count",
            locale = locale,
            number = stats.answered,
            percent = percent(stats.answered, stats.total)
        )
        .to_string(),
    ];

    lines.push(match stats.mean_resolution_secs {
        Some(mean) if mean.is_finite() => {
            t!("questions.view.average_time", locale = locale, time = format_time(mean)).to_string()
        }
        _ => t!("questions.view.no_average_time", locale = locale).to_string(),
    });
    lines.join("\n")
}

pub async fn handle_callback_view_questions_statistics(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let stats = turn.app.records.question_stats(now(), turn.app.lease_secs).await?;
    let anchor = turn
        .present(
            render_statistics(&stats, locale),
            Some(get_back_keyboard(locale, Action::ViewQuestions)),
        )
        .await;
    Ok(Outcome::Present {
        tag: StateTag::ViewQuestionsStatistics,
        anchor,
    })
}

pub async fn handle_callback_view_questions_list(turn: &mut Turn<'_>) -> BotResult<Outcome> {
    let locale = turn.locale();
    let anchor = turn
        .present(
            t!("questions.view.input_count_suggestion", locale = locale),
            Some(get_back_keyboard(locale, Action::ViewQuestions)),
        )
        .await;
    Ok(Outcome::Await {
        tag: StateTag::ViewQuestionsList,
        anchor,
    })
}

/// Lists the `count` most recent questions; asking for more than exist lists all of them
/// and appends the total.
pub async fn handle_message_questions_count(turn: &mut Turn<'_>, text: &str) -> BotResult<Outcome> {
    let locale = turn.locale();

    let Some(count) = turn.read_positive(text).await else {
        return Ok(Outcome::Finish);
    };

    let total = turn.app.records.count_questions().await?;
    let texts = turn.app.records.recent_questions(count.min(total)).await?;

    let mut lines: Vec<String> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("{}. {}", index + 1, text))
        .collect();
    if count > total {
        lines.push(t!("questions.view.questions_count", locale = locale, count = total).to_string());
    }

    turn.notify_lines(&lines).await;
    Ok(Outcome::Finish)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_without_answers_has_placeholder() {
        let stats = QuestionStats {
            total: 4,
            unanswered: 3,
            reserved: 1,
            answered: 0,
            mean_resolution_secs: None,
        };
        let text = render_statistics(&stats, "en");
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("75"));
        assert!(text.ends_with(&*t!("questions.view.no_average_time", locale = "en")));
    }

    #[test]
    fn test_statistics_format_mean_time() {
        let stats = QuestionStats {
            total: 2,
            unanswered: 0,
            reserved: 0,
            answered: 2,
            mean_resolution_secs: Some(3725.0),
        };
        assert!(render_statistics(&stats, "en").contains("01:02:05"));
    }
}
