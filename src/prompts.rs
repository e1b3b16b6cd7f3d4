//! Instruction templates sent to the generative model.
//!
//! Every prompt is assembled from three independent pieces so each variant
//! axis can change without touching the others:
//!
//! 1. **Source**: what the model is given ([`PromptPolicy`]): the attached
//!    file itself, or only its name.
//! 2. **Task**: which JSON layout it must return ([`ResponseShape`]).
//! 3. **Rules**: output discipline and the answer language ([`Language`]).
//!
//! Callers can replace the whole instruction via
//! [`crate::config::AnalysisConfig::prompt_template`]; `{file_name}` in the
//! template is substituted with the selected file's name.

use crate::config::{Language, PromptPolicy, ResponseShape};

/// Placeholder substituted in custom templates.
pub const FILE_NAME_PLACEHOLDER: &str = "{file_name}";

/// Build the built-in instruction for the given variant.
pub fn instruction(
    policy: PromptPolicy,
    language: Language,
    shape: ResponseShape,
    file_name: &str,
) -> String {
    let source = match (language, policy) {
        (Language::English, PromptPolicy::DocumentContent) => format!(
            "You are an experienced marketing analyst. The file \"{file_name}\" is attached to this message. \
Read its actual content (text, tables, figures) before answering."
        ),
        (Language::English, PromptPolicy::FilenameOnly) => format!(
            "You are an experienced marketing analyst. You cannot see the file itself; you only know that it is named \"{file_name}\". \
Infer from the name what kind of document it most plausibly is and what such a document typically contains, \
then answer as if you had reviewed a typical document of that kind."
        ),
        (Language::Polish, PromptPolicy::DocumentContent) => format!(
            "Jesteś doświadczonym analitykiem marketingowym. Do tej wiadomości dołączono plik \"{file_name}\". \
Przed odpowiedzią zapoznaj się z jego faktyczną zawartością (tekst, tabele, liczby)."
        ),
        (Language::Polish, PromptPolicy::FilenameOnly) => format!(
            "Jesteś doświadczonym analitykiem marketingowym. Nie widzisz samego pliku; znasz tylko jego nazwę: \"{file_name}\". \
Na podstawie nazwy wywnioskuj, jakim dokumentem najprawdopodobniej jest i co zwykle zawiera taki dokument, \
a następnie odpowiedz tak, jakbyś przeanalizował typowy dokument tego rodzaju."
        ),
    };

    let task = match (language, shape) {
        (Language::English, ResponseShape::MarketingVerdict) => TASK_VERDICT_EN,
        (Language::English, ResponseShape::Insights) => TASK_INSIGHTS_EN,
        (Language::Polish, ResponseShape::MarketingVerdict) => TASK_VERDICT_PL,
        (Language::Polish, ResponseShape::Insights) => TASK_INSIGHTS_PL,
    };

    let grounding = match (language, policy) {
        (Language::English, PromptPolicy::DocumentContent) => GROUNDING_CONTENT_EN,
        (Language::English, PromptPolicy::FilenameOnly) => GROUNDING_FILENAME_EN,
        (Language::Polish, PromptPolicy::DocumentContent) => GROUNDING_CONTENT_PL,
        (Language::Polish, PromptPolicy::FilenameOnly) => GROUNDING_FILENAME_PL,
    };

    let rules = match language {
        Language::English => RULES_EN,
        Language::Polish => RULES_PL,
    };

    format!("{source}\n\n{task}\n\n{grounding}\n\n{rules}")
}

/// Substitute the file name into a user-supplied template.
pub fn render_template(template: &str, file_name: &str) -> String {
    template.replace(FILE_NAME_PLACEHOLDER, file_name)
}

const TASK_VERDICT_EN: &str = r#"TASK
1. Decide whether the document contains marketing data: campaign results, advertising budgets or spend,
   channel performance, conversion or funnel metrics, customer segments, market research, pricing or
   promotion plans, brand or content strategy.
2. If it does, return:
   {"isMarketingData": true,
    "analysis": {"conclusions": [...], "suggestions": [...], "risks": [...], "criticalErrors": [...]}}
   - conclusions: the key findings the data supports
   - suggestions: concrete actions to improve results
   - risks: threats or weak points worth monitoring
   - criticalErrors: mistakes, inconsistencies or missing data that invalidate conclusions (may be empty)
3. If it does not, return:
   {"isMarketingData": false, "reasoning": "<one or two sentences explaining what the document is instead>"}
Include "analysis" only when isMarketingData is true and "reasoning" only when it is false."#;

const TASK_INSIGHTS_EN: &str = r#"TASK
Analyse the document from a marketing perspective and return:
   {"insights": [...], "recommendations": [...]}
   - insights: 3 to 6 short observations about performance, audience, channels or trends
   - recommendations: 3 to 6 concrete, actionable next steps"#;

const TASK_VERDICT_PL: &str = r#"ZADANIE
1. Oceń, czy dokument zawiera dane marketingowe: wyniki kampanii, budżety lub wydatki reklamowe,
   skuteczność kanałów, wskaźniki konwersji lub lejka, segmenty klientów, badania rynku,
   plany cenowe lub promocyjne, strategię marki lub treści.
2. Jeśli tak, zwróć:
   {"isMarketingData": true,
    "analysis": {"conclusions": [...], "suggestions": [...], "risks": [...], "criticalErrors": [...]}}
   - conclusions: najważniejsze wnioski wynikające z danych
   - suggestions: konkretne działania poprawiające wyniki
   - risks: zagrożenia lub słabe punkty wymagające uwagi
   - criticalErrors: błędy, niespójności lub braki danych podważające wnioski (może być pusta)
3. Jeśli nie, zwróć:
   {"isMarketingData": false, "reasoning": "<jedno lub dwa zdania wyjaśniające, czym jest dokument>"}
Pole "analysis" podaj tylko przy isMarketingData = true, a pole "reasoning" tylko przy false."#;

const TASK_INSIGHTS_PL: &str = r#"ZADANIE
Przeanalizuj dokument z perspektywy marketingowej i zwróć:
   {"insights": [...], "recommendations": [...]}
   - insights: od 3 do 6 krótkich obserwacji o wynikach, odbiorcach, kanałach lub trendach
   - recommendations: od 3 do 6 konkretnych, wykonalnych kroków"#;

const GROUNDING_CONTENT_EN: &str = r#"GROUNDING
- Base every point strictly on what the attached file contains. Quote figures exactly as they appear.
- Do NOT invent numbers, campaigns, channels or conclusions that the content does not support.
- If the content is unreadable, empty or too unclear to judge, say so explicitly instead of guessing."#;

const GROUNDING_FILENAME_EN: &str = r#"GROUNDING
- Only the file name is available. Produce a plausible, realistic analysis for a typical document
  with that name; keep figures generic rather than precise."#;

const GROUNDING_CONTENT_PL: &str = r#"PODSTAWA ODPOWIEDZI
- Każdy punkt opieraj wyłącznie na zawartości załączonego pliku. Liczby przytaczaj dokładnie.
- NIE wymyślaj liczb, kampanii, kanałów ani wniosków, których zawartość nie potwierdza.
- Jeśli zawartość jest nieczytelna, pusta lub zbyt niejasna, napisz to wprost zamiast zgadywać."#;

const GROUNDING_FILENAME_PL: &str = r#"PODSTAWA ODPOWIEDZI
- Dostępna jest tylko nazwa pliku. Przygotuj wiarygodną, realistyczną analizę typowego dokumentu
  o takiej nazwie; liczby podawaj ogólnie, a nie precyzyjnie."#;

const RULES_EN: &str = r#"OUTPUT FORMAT
- Respond with a single JSON object and nothing else.
- Do NOT wrap the JSON in markdown fences and do NOT add commentary.
- Every list item is a short plain-text sentence.
- Write all text values in English."#;

const RULES_PL: &str = r#"FORMAT ODPOWIEDZI
- Odpowiedz jednym obiektem JSON i niczym więcej.
- NIE otaczaj JSON-a blokiem markdown i NIE dodawaj komentarzy.
- Każdy element listy to krótkie zdanie zwykłym tekstem.
- Wszystkie wartości tekstowe pisz po polsku. Klucze JSON pozostaw bez zmian."#;
