//! The case-progression session driver.

use futures_util::future::join_all;

use gumshoe_types::{CaseError, CaseRun, Clue, InterrogationTurn, Question, SuspectKey};

use crate::interrogate::{InterrogationError, Interrogator};

/// Outcome of the terminal accusation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accused: SuspectKey,
    pub culprit: SuspectKey,
    pub correct: bool,
}

/// One player's run: a [`CaseRun`] plus the orchestrator that answers for
/// the suspects.
///
/// An explicit, owned session object; nothing here is global, so multiple
/// concurrent runs are just multiple `Investigation` values.
#[derive(Debug)]
pub struct Investigation {
    case: CaseRun,
    interrogator: Interrogator,
    roster: Vec<SuspectKey>,
}

impl Investigation {
    /// Build a session over the given orchestrator. Reads the suspect roster
    /// from content once; the roster is fixed for the life of the run.
    pub fn new(interrogator: Interrogator) -> Result<Self, InterrogationError> {
        let roster = interrogator.store().roster()?;
        Ok(Self {
            case: CaseRun::new(),
            interrogator,
            roster,
        })
    }

    #[must_use]
    pub fn case(&self) -> &CaseRun {
        &self.case
    }

    #[must_use]
    pub fn roster(&self) -> &[SuspectKey] {
        &self.roster
    }

    /// Leave the intro and open day 1.
    pub fn begin(&mut self) -> Result<(), InterrogationError> {
        self.case.begin()?;
        Ok(())
    }

    fn resolve_known(&self, name: &str) -> Result<SuspectKey, InterrogationError> {
        let key =
            SuspectKey::new(name).map_err(|e| InterrogationError::Validation(e.to_string()))?;
        if !self.roster.contains(&key) {
            return Err(InterrogationError::Validation(format!(
                "unknown suspect: {key}"
            )));
        }
        Ok(key)
    }

    /// Ask the suspect one question and record the turn.
    ///
    /// The budget guard runs before the orchestrator is contacted, so an
    /// exhausted suspect costs no network call. On any failure the turn is
    /// not recorded and the error propagates unchanged.
    pub async fn ask_question(
        &mut self,
        suspect: &str,
        question: &str,
    ) -> Result<String, InterrogationError> {
        let key = self.resolve_known(suspect)?;
        let question = Question::new(question)
            .map_err(|e| InterrogationError::Validation(e.to_string()))?;
        self.case.ensure_can_ask(&key)?;

        let answer = self.interrogator.ask(key.as_str(), question.as_str()).await?;
        self.case.record_turn(InterrogationTurn::new(
            key,
            question.into_inner(),
            answer.clone(),
        ))?;
        Ok(answer)
    }

    /// Add a suspect to today's interviewed set. Idempotent.
    pub fn mark_interviewed(&mut self, suspect: &str) -> Result<(), InterrogationError> {
        let key = self.resolve_known(suspect)?;
        self.case.mark_interviewed(key)?;
        Ok(())
    }

    /// Seal the current day with its three top suspects and unlock their
    /// clues, then advance to the next day or to the final accusation.
    ///
    /// The three lookups are independent reads; they are issued together and
    /// must all settle before the day transition commits. Returns the clues
    /// unlocked (a miss yields the placeholder text, never an error).
    pub async fn end_day(&mut self, top_three: &[&str]) -> Result<Vec<Clue>, InterrogationError> {
        let keys = top_three
            .iter()
            .map(|name| self.resolve_known(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.case.validate_top_suspects(&keys)?;
        let day = self.case.current_day().ok_or(CaseError::NotInvestigating)?;

        let store = self.interrogator.store();
        let texts = join_all(
            keys.iter()
                .map(|key| async move { store.clue(day, key) }),
        )
        .await;

        let clues: Vec<Clue> = keys
            .iter()
            .zip(texts)
            .map(|(suspect, text)| Clue {
                day,
                suspect: suspect.clone(),
                text,
                discovered: true,
            })
            .collect();

        self.case.seal_day(keys, clues.clone())?;
        tracing::info!(day, "Day sealed; {} clues unlocked", clues.len());
        Ok(clues)
    }

    /// Make the single terminal accusation and learn the verdict.
    pub fn accuse(&mut self, suspect: &str) -> Result<Verdict, InterrogationError> {
        let key = self.resolve_known(suspect)?;
        let culprit = self.interrogator.store().solution()?;
        self.case.accuse(key.clone())?;
        Ok(Verdict {
            correct: key == culprit,
            accused: key,
            culprit,
        })
    }

    /// Discard the whole run and start over at the intro.
    pub fn reset(&mut self) {
        self.case = CaseRun::new();
    }
}

#[cfg(test)]
mod tests {
    use super::Investigation;
    use crate::interrogate::{InterrogationError, Interrogator};
    use gumshoe_content::ContentStore;
    use gumshoe_providers::{ChatClient, ProviderError, RetryConfig};
    use gumshoe_types::{CaseError, CasePhase, SuspectKey};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUSPECTS: [&str; 4] = ["zane", "serena", "logan", "nora"];

    fn key(name: &str) -> SuspectKey {
        SuspectKey::new(name).unwrap()
    }

    fn content_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for suspect in SUSPECTS {
            fs::create_dir_all(dir.path().join("suspects")).unwrap();
            fs::write(
                dir.path().join("suspects").join(format!("{suspect}.json")),
                format!(r#"{{"backstory": "{suspect} was aboard that night.", "tone": "nervous"}}"#),
            )
            .unwrap();
        }
        fs::create_dir_all(dir.path().join("prompts")).unwrap();
        fs::write(
            dir.path().join("prompts").join("interrogation_prompt.txt"),
            "You are {name}, tone {tone}. {backstory} Answer: {question}",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("clues/day1")).unwrap();
        fs::write(
            dir.path().join("clues/day1/zane.txt"),
            "A bloodied cufflink.",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("story")).unwrap();
        fs::write(
            dir.path().join("story/solution.json"),
            r#"{"culprit": "serena"}"#,
        )
        .unwrap();
        dir
    }

    async fn mock_provider(answer: &str, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": answer}}]
            })))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    fn investigation(dir: &TempDir, provider_url: &str) -> Investigation {
        let store = ContentStore::new(dir.path());
        let client = ChatClient::new(gumshoe_types::ApiKey::new("sk-test"))
            .unwrap()
            .with_base_url(provider_url)
            .with_retry_config(RetryConfig {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
            });
        let mut session = Investigation::new(Interrogator::new(store, client)).unwrap();
        session.begin().unwrap();
        session
    }

    #[tokio::test]
    async fn five_questions_then_sixth_rejected_without_provider_contact() {
        let dir = content_fixture();
        // expect(5): the sixth ask must never reach the provider.
        let server = mock_provider("I already told you everything.", 5).await;
        let mut session = investigation(&dir, &server.uri());

        for _ in 0..5 {
            session.ask_question("zane", "Where were you?").await.unwrap();
        }
        let err = session
            .ask_question("zane", "Where were you?")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterrogationError::Case(CaseError::BudgetExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_suspect_rejected_before_network() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        let err = session
            .ask_question("the butler", "Did you do it?")
            .await
            .unwrap_err();
        assert!(matches!(err, InterrogationError::Validation(_)));
        assert!(err.is_caller_error());
    }

    #[tokio::test]
    async fn blank_question_rejected_before_network() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        let err = session.ask_question("zane", "   ").await.unwrap_err();
        assert!(matches!(err, InterrogationError::Validation(_)));
    }

    #[tokio::test]
    async fn provider_failure_records_no_turn() {
        let dir = content_fixture();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error": {"message": "bad request"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        let mut session = investigation(&dir, &server.uri());

        let err = session
            .ask_question("zane", "Where were you?")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterrogationError::Provider(ProviderError::Upstream(_))
        ));
        assert!(session.case().sessions()[0].turns_for(&key("zane")).is_empty());
    }

    #[tokio::test]
    async fn end_day_unlocks_clues_and_advances() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        let clues = session.end_day(&["zane", "serena", "logan"]).await.unwrap();
        assert_eq!(clues.len(), 3);
        assert_eq!(clues[0].text, "Clue about Zane: A bloodied cufflink.");
        // No clue files exist for the other two; they get the placeholder.
        assert_eq!(clues[1].text, "No new clues for Serena today.");
        assert!(clues.iter().all(|clue| clue.discovered));

        assert_eq!(session.case().current_day(), Some(2));
        assert_eq!(session.case().clues().len(), 3);
    }

    #[tokio::test]
    async fn end_day_with_wrong_selection_leaves_day_unsealed() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        let err = session.end_day(&["zane", "serena"]).await.unwrap_err();
        assert!(matches!(
            err,
            InterrogationError::Case(CaseError::WrongTopSuspectCount { got: 2 })
        ));

        let err = session.end_day(&["zane", "serena", "whoever"]).await.unwrap_err();
        assert!(matches!(err, InterrogationError::Validation(_)));

        assert!(!session.case().sessions()[0].is_sealed());
        assert_eq!(session.case().current_day(), Some(1));
        assert!(session.case().clues().is_empty());
    }

    #[tokio::test]
    async fn third_day_end_reaches_final_accusation() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        for _ in 0..3 {
            session.end_day(&["zane", "serena", "logan"]).await.unwrap();
        }
        assert_eq!(session.case().phase(), CasePhase::FinalAccusation);

        let err = session
            .ask_question("zane", "One more thing...")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterrogationError::Case(CaseError::NotInvestigating)
        ));
    }

    #[tokio::test]
    async fn accuse_once_yields_verdict_and_second_is_rejected() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        for _ in 0..3 {
            session.end_day(&["zane", "serena", "logan"]).await.unwrap();
        }

        let verdict = session.accuse("Serena").unwrap();
        assert!(verdict.correct);
        assert_eq!(verdict.accused, key("serena"));
        assert_eq!(verdict.culprit, key("serena"));

        let err = session.accuse("zane").unwrap_err();
        assert!(matches!(
            err,
            InterrogationError::Case(CaseError::AlreadyResolved)
        ));
        assert_eq!(session.case().accusation(), Some(&key("serena")));
    }

    #[tokio::test]
    async fn wrong_accusation_is_incorrect() {
        let dir = content_fixture();
        let server = mock_provider("unused", 0).await;
        let mut session = investigation(&dir, &server.uri());

        for _ in 0..3 {
            session.end_day(&["zane", "serena", "logan"]).await.unwrap();
        }
        let verdict = session.accuse("zane").unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.culprit, key("serena"));
    }

    #[tokio::test]
    async fn reset_restores_initial_state_after_any_sequence() {
        let dir = content_fixture();
        let server = mock_provider("Nothing to add.", 1).await;
        let mut session = investigation(&dir, &server.uri());

        session.ask_question("nora", "What did you see?").await.unwrap();
        session.mark_interviewed("nora").unwrap();
        session.end_day(&["zane", "serena", "logan"]).await.unwrap();

        session.reset();
        assert_eq!(session.case(), &gumshoe_types::CaseRun::new());
        assert_eq!(session.case().phase(), CasePhase::Intro);

        // A reset run can begin again from scratch.
        session.begin().unwrap();
        assert_eq!(session.case().current_day(), Some(1));
    }
}
