//! Profile completeness score (0-100), used to order non-boosted
//! discovery candidates. Weights: primary photo 20, basic fields 25,
//! long description 15, social handle 10, extra photos up to 20,
//! prompts 10.

use crate::models::Profile;

const MIN_DESCRIPTION_LEN: usize = 20;

pub fn completeness(profile: &Profile) -> i32 {
    let mut score = 0;

    if !profile.photo_url.trim().is_empty() {
        score += 20;
    }
    if !profile.first_name.trim().is_empty() {
        score += 5;
    }
    if !profile.last_name.trim().is_empty() {
        score += 5;
    }
    if profile.age > 0 {
        score += 5;
    }
    if !profile.gender.trim().is_empty() {
        score += 5;
    }
    if !profile.orientation.trim().is_empty() {
        score += 5;
    }
    if profile.description.trim().len() > MIN_DESCRIPTION_LEN {
        score += 15;
    }
    if !profile.social_handle.trim().is_empty() {
        score += 10;
    }

    let extra = profile
        .extra_photos
        .iter()
        .filter(|u| !u.trim().is_empty())
        .count() as i32;
    score += (extra * 5).min(20);

    let prompt_count = profile
        .prompts
        .as_object()
        .map(|m| {
            m.values()
                .filter(|v| v.as_str().map_or(false, |s| !s.trim().is_empty()))
                .count()
        })
        .unwrap_or(0);
    if prompt_count > 0 {
        score += 10;
    }

    score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile() -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            account_id: 1,
            character_id: 10,
            character_name: "Ray Vercetti".into(),
            first_name: "Ray".into(),
            last_name: "Vercetti".into(),
            age: 24,
            weight: None,
            gender: "male".into(),
            orientation: "hetero".into(),
            phone: None,
            social_handle: "rayv".into(),
            description: "long enough description of this person".into(),
            photo_url: "https://cdn.example/ray.jpg".into(),
            extra_photos: vec![],
            prompts: serde_json::json!({}),
            looking_for: None,
            is_verified: false,
            created_at: now,
            updated_at: now,
            last_active_at: now,
        }
    }

    #[test]
    fn full_basic_profile_scores_base_weights() {
        // photo 20 + names 10 + age 5 + gender 5 + orientation 5
        // + description 15 + handle 10
        assert_eq!(completeness(&profile()), 70);
    }

    #[test]
    fn extra_photos_cap_at_twenty() {
        let mut p = profile();
        p.extra_photos = vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()];
        assert_eq!(completeness(&p), 90);
    }

    #[test]
    fn blank_extra_photos_do_not_count() {
        let mut p = profile();
        p.extra_photos = vec!["  ".into(), "x".into()];
        assert_eq!(completeness(&p), 75);
    }

    #[test]
    fn short_description_earns_nothing() {
        let mut p = profile();
        p.description = "short".into();
        assert_eq!(completeness(&p), 55);
    }

    #[test]
    fn prompts_need_at_least_one_non_blank_answer() {
        let mut p = profile();
        p.prompts = serde_json::json!({"q1": "  "});
        assert_eq!(completeness(&p), 70);
        p.prompts = serde_json::json!({"q1": "an answer"});
        assert_eq!(completeness(&p), 80);
    }

    #[test]
    fn score_never_exceeds_hundred() {
        let mut p = profile();
        p.extra_photos = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        p.prompts = serde_json::json!({"q1": "yes", "q2": "also"});
        assert_eq!(completeness(&p), 100);
    }
}
