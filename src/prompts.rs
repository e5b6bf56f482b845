use crate::models::{non_blank, ImageAttachment, PoemPrompt, PoemRequest};

pub const RECOMMEND_SYSTEM: &str = include_str!("../data/prompts/recommend_system.txt");
pub const RETRY_EMPHASIS: &str = include_str!("../data/prompts/retry_emphasis.txt");
pub const RECOMMEND_USER: &str = include_str!("../data/prompts/recommend_user.txt");

/// How firmly the system prompt insists on the recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Standard,
    /// Used after a copyright refusal: the base rules plus an explicit
    /// instruction to answer with a public-domain poem and nothing else.
    Strict,
}

/// Builds the prompt for one recommendation call.
pub fn recommendation(
    request: &PoemRequest,
    image: Option<ImageAttachment>,
    strictness: Strictness,
) -> PoemPrompt {
    let system = match strictness {
        Strictness::Standard => RECOMMEND_SYSTEM.trim_end().to_string(),
        Strictness::Strict => format!(
            "{}\n\n{}",
            RECOMMEND_SYSTEM.trim_end(),
            RETRY_EMPHASIS.trim_end()
        ),
    };
    let user_text = render(RECOMMEND_USER, &[("context", &user_context(request))])
        .trim_end()
        .to_string();

    PoemPrompt {
        system,
        user_text,
        image,
    }
}

/// Assembles the user-turn context lines from whatever the request carries.
fn user_context(request: &PoemRequest) -> String {
    let mut lines = Vec::new();
    if let Some(mood) = non_blank(request.mood_tag.as_deref()) {
        lines.push(format!("분위기: {}", mood));
    }
    if let Some(story) = non_blank(request.story.as_deref()) {
        lines.push(format!("사연: {}", story));
    }
    if let Some(score) = request.emotion_score.filter(|s| s.is_finite()) {
        lines.push(format!("감정 정도: {}/10", score.clamp(0.0, 10.0)));
    }

    if lines.is_empty() {
        "사진과 어울리는 시를 추천해주세요.".to_string()
    } else {
        lines.join("\n")
    }
}

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("시인: {{author}}", &[("author", "윤동주")]),
            "시인: 윤동주"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!RECOMMEND_SYSTEM.is_empty());
        assert!(!RETRY_EMPHASIS.is_empty());
        assert!(!RECOMMEND_USER.is_empty());
    }

    #[test]
    fn test_user_template_has_context_placeholder() {
        assert!(RECOMMEND_USER.contains("{{context}}"));
    }

    #[test]
    fn test_system_prompt_states_the_rules() {
        assert!(RECOMMEND_SYSTEM.contains("1955"));
        assert!(RECOMMEND_SYSTEM.contains("250"));
        assert!(RECOMMEND_SYSTEM.contains("개인정보"));
    }

    #[test]
    fn test_strict_prompt_extends_the_standard_one() {
        let request = PoemRequest {
            mood_tag: Some("그리움".to_string()),
            ..Default::default()
        };
        let standard = recommendation(&request, None, Strictness::Standard);
        let strict = recommendation(&request, None, Strictness::Strict);

        assert!(strict.system.starts_with(&standard.system));
        assert!(strict.system.contains("반드시"));
        assert!(!standard.system.contains("반드시"));
        assert_eq!(strict.user_text, standard.user_text);
    }

    #[test]
    fn test_user_context_includes_all_signals() {
        let request = PoemRequest {
            story: Some("할머니와 걷던 바닷가".to_string()),
            mood_tag: Some("그리움".to_string()),
            emotion_score: Some(7.0),
            ..Default::default()
        };
        let prompt = recommendation(&request, None, Strictness::Standard);
        assert!(prompt.user_text.contains("분위기: 그리움"));
        assert!(prompt.user_text.contains("사연: 할머니와 걷던 바닷가"));
        assert!(prompt.user_text.contains("감정 정도: 7/10"));
    }

    #[test]
    fn test_image_only_request_gets_fallback_context() {
        let request = PoemRequest {
            image_url: Some("data:image/jpeg;base64,abc".to_string()),
            ..Default::default()
        };
        let prompt = recommendation(&request, None, Strictness::Standard);
        assert!(prompt.user_text.contains("사진과 어울리는 시를 추천해주세요."));
    }

    #[test]
    fn test_emotion_score_is_clamped() {
        let over = PoemRequest {
            emotion_score: Some(42.0),
            mood_tag: Some("기쁨".to_string()),
            ..Default::default()
        };
        let prompt = recommendation(&over, None, Strictness::Standard);
        assert!(prompt.user_text.contains("감정 정도: 10/10"));

        let under = PoemRequest {
            emotion_score: Some(-3.0),
            mood_tag: Some("기쁨".to_string()),
            ..Default::default()
        };
        let prompt = recommendation(&under, None, Strictness::Standard);
        assert!(prompt.user_text.contains("감정 정도: 0/10"));
    }

    #[test]
    fn test_prompt_carries_the_image() {
        let attachment = ImageAttachment {
            mime: "image/jpeg".to_string(),
            data: "aGVsbG8=".to_string(),
        };
        let request = PoemRequest::default();
        let prompt = recommendation(&request, Some(attachment.clone()), Strictness::Standard);
        assert_eq!(prompt.image, Some(attachment));
    }
}
