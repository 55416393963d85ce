use std::sync::atomic::{AtomicU64, Ordering};

/// Номер запроса, выданный `RequestSequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Счётчик запросов для отбрасывания устаревших ответов.
///
/// Каждый новый запрос берёт билет; ответ применяется, только если его билет
/// всё ещё последний выданный. Более поздний запрос "перебивает" все ранние.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Делает все выданные билеты устаревшими.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_ticket_supersedes_earlier() {
        let seq = RequestSequence::new();
        let first = seq.next();
        assert!(seq.is_current(first));
        let second = seq.next();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        seq.invalidate();
        assert!(!seq.is_current(second));
    }
}
