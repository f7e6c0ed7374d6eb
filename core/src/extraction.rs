//! Prompt and text extraction for the photo analyzer.
//!
//! The model is asked for a fixed Korean layout but nothing enforces it, so
//! parsing is best-effort per field. Two primitives do all the work:
//! [`extract_section`] for free-text blocks and [`extract_number`] for the
//! nutrient lines.
//!
//! `extract_number` scans the whole reply, not just the nutrient block. A
//! keyword that shows up earlier in prose (e.g. "단백질" inside the food name
//! line) is matched there instead, and whatever number follows it on that
//! line is returned.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

pub const FOOD_NAME_MARKER: &str = "🍽 음식 이름:";
pub const NUTRITION_HEADER_MARKER: &str = "🔥 영양정보 (1인분 기준)";
pub const ADVANTAGE_MARKER: &str = "💡 운동 후 섭취 시 장점:";
pub const CAUTION_MARKER: &str = "⚠️ 주의사항:";

/// Build the photo-analysis prompt. A non-blank hint is placed ahead of the
/// format instructions and takes priority over what the model sees.
pub fn build_analysis_prompt(food_name_hint: Option<&str>) -> String {
    let clarification = food_name_hint
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .map(|hint| {
            format!(
                "사용자가 입력한 음식 이름은 **'{hint}'**입니다. AI는 이 정보를 최우선으로 고려하여 분석해야 합니다."
            )
        })
        .unwrap_or_default();

    format!(
        "당신은 한국 음식 영양분석에 전문적인 헬스 트레이너이자 영양 코치입니다.
음식 사진을 보고 영양 성분을 1인분 기준으로 추정하세요.

{clarification}

**[중요]**
1. 사진에 보이는 음식의 종류(예: 밥, 닭가슴살, 김치)와 양(예: 밥 200g, 닭가슴살 100g)을 최대한 구체적으로 고려하여 분석을 수행해야 합니다.
2. 음식의 일반적인 레시피를 바탕으로 현실적이고 정량적인 수치만 추정하세요.
3. 추정된 영양소 값이 비현실적(예: 탄수화물 0g, 단백질 1000g)이지 않도록 주의하세요.

반드시 아래 형식을 그대로 유지하고 한국어로 작성하세요.
(모든 수치는 단위 포함 : kcal, g, mg)

{FOOD_NAME_MARKER}
{NUTRITION_HEADER_MARKER}
- 열량(kcal):
- 탄수화물(g):
- 단백질(g):
- 지방(g):
- 당류(g):
- 나트륨(mg):

{ADVANTAGE_MARKER}
{CAUTION_MARKER}

출력은 위 형식 그대로, 문장과 숫자만 포함된 깔끔한 텍스트로 작성하세요.
"
    )
}

/// Text strictly between `start` and the first `end` after it, trimmed.
///
/// Returns "" when `start` is absent. A missing or empty `end` (or one that
/// never appears after `start`) runs to the end of the text.
pub fn extract_section<'a>(text: &'a str, start: &str, end: Option<&str>) -> &'a str {
    let Some(start_idx) = text.find(start) else {
        return "";
    };
    let body = &text[start_idx + start.len()..];
    let end_idx = end
        .filter(|marker| !marker.is_empty())
        .and_then(|marker| body.find(marker))
        .unwrap_or(body.len());
    body[..end_idx].trim()
}

/// First run of decimal digits following `keyword` on the same line, taken
/// from the leftmost occurrence of the keyword that has digits after it.
/// Any Unicode decimal digit counts, so full-width "３５" reads as 35.
/// `None` when the keyword is absent, no occurrence has digits on its line,
/// or the digits overflow `u32`.
pub fn extract_number(text: &str, keyword: &str) -> Option<u32> {
    let pattern = format!(r"{}.*?(\d+)", regex::escape(keyword));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)?
        .get(1)?
        .as_str()
        .chars()
        .try_fold(0u32, |acc, c| acc.checked_mul(10)?.checked_add(digit_value(c)?))
}

static DECIMAL_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("valid decimal digit regex"));

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Value of a Unicode decimal digit. Decimal digits are laid out in
/// contiguous runs of whole 0..9 sets, so the value is the offset from the
/// start of the run, mod 10.
fn digit_value(c: char) -> Option<u32> {
    if let Some(value) = c.to_digit(10) {
        return Some(value);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Carbohydrate,
    Protein,
    Fat,
    Sugar,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Calories,
        Nutrient::Carbohydrate,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Sugar,
        Nutrient::Sodium,
    ];

    /// Keyword searched for in the reply
    pub fn keyword(self) -> &'static str {
        match self {
            Nutrient::Calories => "열량",
            Nutrient::Carbohydrate => "탄수화물",
            Nutrient::Protein => "단백질",
            Nutrient::Fat => "지방",
            Nutrient::Sugar => "당류",
            Nutrient::Sodium => "나트륨",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Sodium => "mg",
            _ => "g",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Nutrient::Calories => "🔥",
            Nutrient::Carbohydrate => "🌾",
            Nutrient::Protein => "🥩",
            Nutrient::Fat => "🥑",
            Nutrient::Sugar => "🍯",
            Nutrient::Sodium => "🧂",
        }
    }
}

/// Best-effort values scraped from one reply. `None` means "not extracted",
/// which is different from a measured zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct NutritionEstimate {
    pub food_name: String,
    pub calories_kcal: Option<u32>,
    pub carbs_g: Option<u32>,
    pub protein_g: Option<u32>,
    pub fat_g: Option<u32>,
    pub sugar_g: Option<u32>,
    pub sodium_mg: Option<u32>,
}

impl NutritionEstimate {
    pub fn get(&self, nutrient: Nutrient) -> Option<u32> {
        match nutrient {
            Nutrient::Calories => self.calories_kcal,
            Nutrient::Carbohydrate => self.carbs_g,
            Nutrient::Protein => self.protein_g,
            Nutrient::Fat => self.fat_g,
            Nutrient::Sugar => self.sugar_g,
            Nutrient::Sodium => self.sodium_mg,
        }
    }

    /// Feature row `[carbs_g, protein_g, fat_g, sugar_g, sodium_mg]`, or the
    /// list of nutrients that are missing from it.
    pub fn correction_features(&self) -> Result<[f64; 5], Vec<Nutrient>> {
        let order = [
            Nutrient::Carbohydrate,
            Nutrient::Protein,
            Nutrient::Fat,
            Nutrient::Sugar,
            Nutrient::Sodium,
        ];
        let missing: Vec<Nutrient> = order
            .iter()
            .copied()
            .filter(|n| self.get(*n).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut row = [0.0; 5];
        for (slot, nutrient) in row.iter_mut().zip(order) {
            *slot = self.get(nutrient).map(f64::from).unwrap_or_default();
        }
        Ok(row)
    }

    pub fn is_empty(&self) -> bool {
        self.food_name.is_empty() && Nutrient::ALL.iter().all(|n| self.get(*n).is_none())
    }
}

/// Everything parsed out of one analyzer reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParsedAnalysis {
    pub estimate: NutritionEstimate,
    pub advantage: String,
    pub caution: String,
}

pub fn parse_analysis(text: &str) -> ParsedAnalysis {
    let text = text.trim();
    let estimate = NutritionEstimate {
        food_name: extract_section(text, FOOD_NAME_MARKER, Some(NUTRITION_HEADER_MARKER))
            .to_string(),
        calories_kcal: extract_number(text, Nutrient::Calories.keyword()),
        carbs_g: extract_number(text, Nutrient::Carbohydrate.keyword()),
        protein_g: extract_number(text, Nutrient::Protein.keyword()),
        fat_g: extract_number(text, Nutrient::Fat.keyword()),
        sugar_g: extract_number(text, Nutrient::Sugar.keyword()),
        sodium_mg: extract_number(text, Nutrient::Sodium.keyword()),
    };

    ParsedAnalysis {
        estimate,
        advantage: extract_section(text, ADVANTAGE_MARKER, Some(CAUTION_MARKER)).to_string(),
        caution: extract_section(text, CAUTION_MARKER, None).to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FULL_REPLY: &str = "🍽 음식 이름: 닭가슴살 샐러드
🔥 영양정보 (1인분 기준)
- 열량(kcal): 350kcal
- 탄수화물(g): 20g
- 단백질(g): 35g
- 지방(g): 12g
- 당류(g): 5g
- 나트륨(mg): 600mg

💡 운동 후 섭취 시 장점: 근육 회복에 필요한 단백질을 빠르게 보충할 수 있습니다.
⚠️ 주의사항: 드레싱을 많이 넣으면 열량이 크게 늘어납니다.";

    #[test]
    fn section_between_markers_is_trimmed() {
        assert_eq!(
            extract_section(FULL_REPLY, FOOD_NAME_MARKER, Some(NUTRITION_HEADER_MARKER)),
            "닭가슴살 샐러드"
        );
    }

    #[test]
    fn section_without_start_is_empty_regardless_of_end() {
        assert_eq!(extract_section("아무 내용", "없는 표시:", None), "");
        assert_eq!(extract_section("아무 내용", "없는 표시:", Some("내용")), "");
        assert_eq!(extract_section("", "없는 표시:", Some("")), "");
    }

    #[test]
    fn section_runs_to_end_when_end_marker_missing() {
        assert_eq!(extract_section("A: hello world ", "A:", Some("Z:")), "hello world");
        assert_eq!(extract_section("A: hello", "A:", Some("")), "hello");
        assert_eq!(
            extract_section(FULL_REPLY, CAUTION_MARKER, None),
            "드레싱을 많이 넣으면 열량이 크게 늘어납니다."
        );
    }

    #[test]
    fn end_marker_is_searched_after_start() {
        assert_eq!(extract_section("END A: body END tail", "A:", Some("END")), "body");
    }

    #[test]
    fn number_after_keyword_without_colon() {
        assert_eq!(extract_number("단백질35g", "단백질"), Some(35));
        assert_eq!(extract_number("- 나트륨(mg): 600mg", "나트륨"), Some(600));
    }

    #[test]
    fn number_is_none_when_keyword_absent_or_no_digits_on_line() {
        assert_eq!(extract_number("열량: 200", "당류"), None);
        assert_eq!(extract_number("당류: 적음\n나트륨: 300", "당류"), None);
        assert_eq!(extract_number("당류: 99999999999", "당류"), None);
    }

    #[test]
    fn keyword_in_prose_causes_first_match_there() {
        // "단백질" appears in the food-name line first, so its number is taken
        // from that line rather than from the nutrient line.
        let text = "🍽 음식 이름: 고단백질 쉐이크 2잔\n- 단백질(g): 40g";
        assert_eq!(extract_number(text, "단백질"), Some(2));
    }

    #[test]
    fn full_width_and_other_decimal_digits_are_read() {
        assert_eq!(extract_number("- 단백질(g): ３５g", "단백질"), Some(35));
        assert_eq!(extract_number("열량: ٤٢٠", "열량"), Some(420));
        assert_eq!(extract_number("지방: 1２", "지방"), Some(12));
        assert_eq!(extract_number("당류: ９９９９９９９９９９９", "당류"), None);
    }

    #[test]
    fn regex_metacharacters_in_keyword_are_literal() {
        assert_eq!(extract_number("열량(kcal): 120", "열량(kcal)"), Some(120));
        assert_eq!(extract_number("a.b 7", "a+b"), None);
    }

    #[test]
    fn full_reply_is_parsed() {
        let parsed = parse_analysis(FULL_REPLY);
        assert_eq!(parsed.estimate.food_name, "닭가슴살 샐러드");
        assert_eq!(parsed.estimate.calories_kcal, Some(350));
        assert_eq!(parsed.estimate.carbs_g, Some(20));
        assert_eq!(parsed.estimate.protein_g, Some(35));
        assert_eq!(parsed.estimate.fat_g, Some(12));
        assert_eq!(parsed.estimate.sugar_g, Some(5));
        assert_eq!(parsed.estimate.sodium_mg, Some(600));
        assert!(parsed.advantage.starts_with("근육 회복"));
        assert!(parsed.caution.starts_with("드레싱"));
        assert_eq!(
            parsed.estimate.correction_features().unwrap(),
            [20.0, 35.0, 12.0, 5.0, 600.0]
        );
    }

    #[test]
    fn missing_sugar_line_leaves_field_empty() {
        let reply = FULL_REPLY.replace("- 당류(g): 5g\n", "");
        let parsed = parse_analysis(&reply);
        assert_eq!(parsed.estimate.sugar_g, None);
        assert_eq!(parsed.estimate.calories_kcal, Some(350));
        assert_eq!(
            parsed.estimate.correction_features().unwrap_err(),
            vec![Nutrient::Sugar]
        );
    }

    #[test]
    fn unstructured_reply_yields_empty_estimate() {
        let parsed = parse_analysis("죄송합니다. 이미지를 분석할 수 없습니다.");
        assert!(parsed.estimate.is_empty());
        assert_eq!(parsed.advantage, "");
        assert_eq!(parsed.caution, "");
        assert_eq!(parsed.estimate.correction_features().unwrap_err().len(), 5);
    }

    #[test]
    fn zero_is_kept_distinct_from_missing() {
        let parsed = parse_analysis("- 당류(g): 0g");
        assert_eq!(parsed.estimate.sugar_g, Some(0));
        assert_eq!(parsed.estimate.fat_g, None);
    }

    #[test]
    fn prompt_includes_hint_only_when_present() {
        let with_hint = build_analysis_prompt(Some(" 참치 김치찌개 "));
        assert!(with_hint.contains("**'참치 김치찌개'**"));
        assert!(with_hint.contains(FOOD_NAME_MARKER));
        assert!(with_hint.contains(CAUTION_MARKER));

        let without = build_analysis_prompt(Some("   "));
        assert!(!without.contains("사용자가 입력한 음식 이름"));
        assert_eq!(without, build_analysis_prompt(None));
    }

    #[test]
    fn prompt_lists_nutrients_in_fixed_order() {
        let prompt = build_analysis_prompt(None);
        let positions: Vec<usize> = Nutrient::ALL
            .iter()
            .map(|n| prompt.find(&format!("- {}(", n.keyword())).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(prompt.find(ADVANTAGE_MARKER).unwrap() < prompt.find(CAUTION_MARKER).unwrap());
    }
}
