//! Instruction text for the two card sides.
//!
//! Every prompt lives here so a wording change touches exactly one file and
//! unit tests can inspect the text without calling a model. Each side has a
//! system prompt (field list, format grammar, JSON template) and a short user
//! prompt sent alongside the image.

use crate::schema::Side;

/// System prompt for the front of the card: five scalar fields.
pub const FRONT_SYSTEM_PROMPT: &str = r#"Extract the following details from the given Alien Registration Card (Front side) in the image.
If any data is obscured or not visible, please return 'masked' for that field.
The 5 information items are:
1. 외국인등록번호 (Registration No.): 13 digits, 6 digits for the year, 7 digits for the serial number, separated by '-'.
2. 성명 (Name): Written in English.
3. 국가/지역 (Country/Region): Written in English.
4. 체류자격 (Status): Form of "Explanation(VISA Type)". Explanation is written in Korean. VISA Type is composed of letter - number.
5. 발급일자 (Issue Date): Form of "YYYY.MM.DD"
Return the extracted information as a single JSON object in the following format:
{
    "Registration No.": "",
    "Name": "",
    "Country/Region": "",
    "Status": "",
    "Issue Date": ""
}"#;

/// System prompt for the back of the card: serial number plus the stay table.
pub const BACK_SYSTEM_PROMPT: &str = r#"Extract the following details from the given Alien Registration Card (Back side) in the image.
If any data is obscured or not visible, please return 'masked' for that field.
The 2 information items are:
1. 일련번호 (Serial No.): 10 digits, separated by '-'. Format is like X-XXX-XXX-XXXX. Don't miss any digit and make sure the every digit is correct.
2. 체류기간 (Duration of Stay): Tabular format. There are 3 columns: 허가일자, 만료일자, 확인. 허가일자 and 만료일자 are written in "YYYY.MM.DD" format. 확인 is written in Korean. Get every row of the table.
    Don't miss any row of the table.
    Make sure the every digit is correct and the format is correct.
Return the extracted information as a single JSON object in the following format:
{
    "Serial No.": "",
    "Duration of Stay": [
        {
            "Start Date": "",
            "End Date": "",
            "Check": ""
        }
    ]
}"#;

pub const FRONT_USER_PROMPT: &str = "Please extract the 5 information items from the Alien Registration Card: Registration No., Name, Country/Region, Status, Issue Date.";

pub const BACK_USER_PROMPT: &str =
    "Please extract the information items from the Alien Registration Card back side.";

/// Appended to the system prompt for providers without a JSON response mode.
pub const JSON_ONLY_SUFFIX: &str = "\n\nRespond with the JSON object only. Do not add commentary or wrap it in code fences.";

/// System prompt for a side.
pub fn system_prompt(side: Side) -> &'static str {
    match side {
        Side::Front => FRONT_SYSTEM_PROMPT,
        Side::Back => BACK_SYSTEM_PROMPT,
    }
}

/// User prompt sent with the image for a side.
pub fn user_prompt(side: Side) -> &'static str {
    match side {
        Side::Front => FRONT_USER_PROMPT,
        Side::Back => BACK_USER_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_prompt_names_every_wire_key() {
        for key in ["Registration No.", "Name", "Country/Region", "Status", "Issue Date"] {
            assert!(FRONT_SYSTEM_PROMPT.contains(&format!("\"{key}\"")), "{key}");
        }
    }

    #[test]
    fn back_prompt_names_every_wire_key() {
        for key in ["Serial No.", "Duration of Stay", "Start Date", "End Date", "Check"] {
            assert!(BACK_SYSTEM_PROMPT.contains(&format!("\"{key}\"")), "{key}");
        }
    }

    #[test]
    fn both_prompts_request_masked_sentinel() {
        for side in Side::ALL {
            assert!(system_prompt(side).contains("'masked'"), "{side}");
            assert!(system_prompt(side).contains("JSON object"), "{side}");
        }
    }

    #[test]
    fn sides_get_distinct_prompts() {
        assert_ne!(system_prompt(Side::Front), system_prompt(Side::Back));
        assert_ne!(user_prompt(Side::Front), user_prompt(Side::Back));
    }
}
