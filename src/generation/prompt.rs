// Grounded prompt assembly for the answer generator
use chrono::NaiveDate;

/// Build the system+user prompt around the assembled context block.
///
/// The instructions pin the model to the retrieved documents and to the
/// reference date so it does not resurface deadlines the temporal filter
/// already considered current but the model might phrase as past.
pub fn build_prompt(context: &str, question: &str, today: NaiveDate, contact_email: &str) -> String {
    let date_line = today.format("%B %d, %Y");

    format!(
        "You are the official AI assistant for the University of Chicago's MS in Applied Data Science program.\n\
         Use only the following extracted documents to answer - do not hallucinate.\n\
         Today's date is {date_line}. Do not list deadlines that have already passed relative to today.\n\
         \n\
         If the answer cannot be verified from the official program information, do not guess.\n\
         If you cannot find the answer, politely tell the user to reach out to the admissions contact email:\n\
         {contact_email}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer:\n"
    )
}
