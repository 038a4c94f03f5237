//! Randomized questions drawn from the port catalog.
//!
//! Which ports and question kinds are eligible grows with the level:
//! levels 1-2 ask about beginner ports, 3-4 add intermediate ones, 5 adds
//! advanced ones. Typed port-number questions unlock at
//! `quiz.port_entry_min_level`.

use std::collections::BTreeSet;

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use portstudy_core::{Level, PortCatalog, PortDifficulty, PortInfo, Transport};

use crate::config::QuizConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    PortToProtocol,
    ProtocolToPort,
    ProtocolToTransport,
    PortToUsage,
    ProtocolToDescription,
    PortEntry,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub kind: QuestionKind,
    pub text: String,
    pub answer: String,
    /// Empty for typed port-number questions.
    pub choices: Vec<String>,
    pub port: String,
    pub info: PortInfo,
}

impl Question {
    pub fn is_port_entry(&self) -> bool {
        self.kind == QuestionKind::PortEntry
    }

    /// `choice` is 1-based, as typed.
    pub fn check_choice(&self, choice: usize) -> bool {
        choice
            .checked_sub(1)
            .and_then(|i| self.choices.get(i))
            .is_some_and(|c| *c == self.answer)
    }

    pub fn check_port(&self, port: u16) -> bool {
        port.to_string() == self.answer
    }
}

pub struct QuestionGenerator<'a> {
    catalog: &'a PortCatalog,
    quiz: &'a QuizConfig,
}

impl<'a> QuestionGenerator<'a> {
    pub fn new(catalog: &'a PortCatalog, quiz: &'a QuizConfig) -> Self {
        Self { catalog, quiz }
    }

    fn eligible_ports(&self, level: Level) -> Vec<&'a str> {
        let allowed = |d: PortDifficulty| match d {
            PortDifficulty::Beginner => true,
            PortDifficulty::Intermediate => level >= 3,
            PortDifficulty::Advanced => level >= 5,
        };
        let ports: Vec<&str> = self
            .catalog
            .iter()
            .filter(|(_, info)| allowed(info.difficulty))
            .map(|(port, _)| port)
            .collect();

        if ports.is_empty() {
            // A custom catalog may have nothing at the beginner tier.
            self.catalog.iter().map(|(port, _)| port).collect()
        } else {
            ports
        }
    }

    fn weight(&self, difficulty: PortDifficulty) -> u32 {
        let w = &self.quiz.port_weights;
        match difficulty {
            PortDifficulty::Beginner => w.beginner,
            PortDifficulty::Intermediate => w.intermediate,
            PortDifficulty::Advanced => w.advanced,
        }
    }

    fn select_port<R: Rng + ?Sized>(&self, rng: &mut R, level: Level) -> &'a str {
        let ports = self.eligible_ports(level);
        let weights = ports.iter().map(|port| {
            self.catalog
                .get(port)
                .map_or(0, |info| self.weight(info.difficulty))
        });
        match WeightedIndex::new(weights) {
            Ok(dist) => ports[dist.sample(rng)],
            // All weights zero: fall back to a uniform pick.
            Err(_) => ports.choose(rng).copied().unwrap_or_default(),
        }
    }

    fn wants_port_entry<R: Rng + ?Sized>(&self, rng: &mut R, level: Level) -> bool {
        if level < self.quiz.port_entry_min_level {
            return false;
        }
        WeightedIndex::new([self.quiz.standard_weight, self.quiz.port_entry_weight])
            .map(|dist| dist.sample(rng) == 1)
            .unwrap_or(false)
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, level: Level) -> Question {
        let port = self.select_port(rng, level);
        let info = self.catalog.get(port).cloned().unwrap_or_else(|| PortInfo {
            protocol: String::new(),
            transport: Transport::Tcp,
            common_usage: String::new(),
            description: String::new(),
            difficulty: PortDifficulty::default(),
            similar_ports: Vec::new(),
        });

        if self.wants_port_entry(rng, level) {
            return Question {
                kind: QuestionKind::PortEntry,
                text: format!("What port number does {} use?", info.protocol),
                answer: port.to_string(),
                choices: Vec::new(),
                port: port.to_string(),
                info,
            };
        }

        let mut kinds = vec![QuestionKind::PortToProtocol, QuestionKind::ProtocolToPort];
        if level >= 2 {
            kinds.push(QuestionKind::ProtocolToTransport);
        }
        if level >= 3 {
            kinds.push(QuestionKind::PortToUsage);
            if !info.description.is_empty() {
                kinds.push(QuestionKind::ProtocolToDescription);
            }
        }
        let kind = kinds
            .choose(rng)
            .copied()
            .unwrap_or(QuestionKind::PortToProtocol);

        let (text, answer) = match kind {
            QuestionKind::PortToProtocol => {
                (format!("What protocol uses port {port}?"), info.protocol.clone())
            }
            QuestionKind::ProtocolToPort | QuestionKind::PortEntry => (
                format!("What port number does {} use?", info.protocol),
                port.to_string(),
            ),
            QuestionKind::ProtocolToTransport => (
                format!("What transport protocol does {} use?", info.protocol),
                info.transport.to_string(),
            ),
            QuestionKind::PortToUsage => (
                format!("What is the primary usage of port {port}?"),
                info.common_usage.clone(),
            ),
            QuestionKind::ProtocolToDescription => (
                format!("Which best describes {}?", info.protocol),
                info.description.clone(),
            ),
        };

        let choices = self.choices(rng, kind, port, &info, &answer, level);
        Question {
            kind,
            text,
            answer,
            choices,
            port: port.to_string(),
            info,
        }
    }

    fn choices<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: QuestionKind,
        port: &str,
        info: &PortInfo,
        answer: &str,
        level: Level,
    ) -> Vec<String> {
        let wanted = self.quiz.choices.saturating_sub(1);

        let mut distractors: Vec<String> = match kind {
            QuestionKind::ProtocolToPort | QuestionKind::PortEntry => {
                let mut picked = Vec::new();
                if level >= 3 {
                    let similar = distinct(info.similar_ports.iter().map(String::as_str), answer);
                    picked = sample(rng, &similar, wanted);
                }
                if picked.len() < wanted {
                    let pool: Vec<String> = self
                        .eligible_ports(level)
                        .into_iter()
                        .filter(|p| *p != port && !picked.iter().any(|q| q == p))
                        .map(str::to_string)
                        .collect();
                    let more = sample(rng, &pool, wanted - picked.len());
                    picked.extend(more);
                }
                picked
            }
            QuestionKind::PortToProtocol => {
                let pool = distinct(self.catalog.iter().map(|(_, i)| i.protocol.as_str()), answer);
                sample(rng, &pool, wanted)
            }
            QuestionKind::ProtocolToTransport => Transport::ALL
                .iter()
                .map(Transport::to_string)
                .filter(|t| t != answer)
                .collect(),
            QuestionKind::PortToUsage => {
                let pool = distinct(
                    self.catalog.iter().map(|(_, i)| i.common_usage.as_str()),
                    answer,
                );
                sample(rng, &pool, wanted)
            }
            QuestionKind::ProtocolToDescription => {
                let pool = distinct(
                    self.catalog.iter().map(|(_, i)| i.description.as_str()),
                    answer,
                );
                sample(rng, &pool, wanted)
            }
        };

        distractors.push(answer.to_string());
        distractors.shuffle(rng);
        distractors
    }
}

/// Unique, non-empty values other than `answer`, in stable order.
fn distinct<'s>(values: impl Iterator<Item = &'s str>, answer: &str) -> Vec<String> {
    values
        .filter(|v| !v.is_empty() && *v != answer)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn sample<R: Rng + ?Sized>(rng: &mut R, pool: &[String], amount: usize) -> Vec<String> {
    pool.choose_multiple(rng, amount).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_level_one_uses_beginner_ports_only() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig::default();
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let mut rng = rng();
        for _ in 0..200 {
            let q = gen.generate(&mut rng, 1);
            assert_eq!(q.info.difficulty, PortDifficulty::Beginner);
            assert!(matches!(
                q.kind,
                QuestionKind::PortToProtocol | QuestionKind::ProtocolToPort
            ));
        }
    }

    #[test]
    fn test_choices_contain_answer_once() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig::default();
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let mut rng = rng();
        for level in 1..=5 {
            for _ in 0..100 {
                let q = gen.generate(&mut rng, level);
                if q.is_port_entry() {
                    assert!(q.choices.is_empty());
                    continue;
                }
                let hits = q.choices.iter().filter(|c| **c == q.answer).count();
                assert_eq!(hits, 1, "{q:?}");
                assert!(q.choices.len() <= quiz.choices);
                let unique: BTreeSet<_> = q.choices.iter().collect();
                assert_eq!(unique.len(), q.choices.len(), "{q:?}");
            }
        }
    }

    #[test]
    fn test_port_entry_only_from_min_level() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig {
            standard_weight: 0,
            port_entry_weight: 1,
            ..QuizConfig::default()
        };
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let mut rng = rng();
        assert!(!gen.generate(&mut rng, 3).is_port_entry());
        let q = gen.generate(&mut rng, 4);
        assert!(q.is_port_entry());
        assert!(q.check_port(q.port.parse().unwrap()));
    }

    #[test]
    fn test_advanced_ports_only_at_level_five() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig::default();
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let mut rng = rng();
        let below: Vec<_> = (0..300).map(|_| gen.generate(&mut rng, 4)).collect();
        assert!(below
            .iter()
            .all(|q| q.info.difficulty != PortDifficulty::Advanced));
        let at_max: Vec<_> = (0..300).map(|_| gen.generate(&mut rng, 5)).collect();
        assert!(at_max
            .iter()
            .any(|q| q.info.difficulty == PortDifficulty::Advanced));
    }

    #[test]
    fn test_check_choice() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig::default();
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let q = gen.generate(&mut rng(), 1);
        let right = q.choices.iter().position(|c| *c == q.answer).unwrap() + 1;
        assert!(q.check_choice(right));
        assert!(!q.check_choice(0));
        assert!(!q.check_choice(q.choices.len() + 1));
    }

    #[test]
    fn test_transport_question_offers_all_transports() {
        let catalog = load_catalog(None).unwrap();
        let quiz = QuizConfig::default();
        let gen = QuestionGenerator::new(&catalog, &quiz);
        let mut rng = rng();
        let q = (0..500)
            .map(|_| gen.generate(&mut rng, 2))
            .find(|q| q.kind == QuestionKind::ProtocolToTransport)
            .unwrap();
        let mut choices = q.choices.clone();
        choices.sort();
        assert_eq!(choices, vec!["TCP", "TCP/UDP", "UDP"]);
    }
}
