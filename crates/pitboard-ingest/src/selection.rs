//! Parsing a batch of upstream event ids from the command line.

use std::str::FromStr;

use crate::Error;

/// A set of upstream event ids: `"1,2,3"`, `"10-20"` or `"7"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSelection {
  List(Vec<i64>),
  /// Inclusive on both ends.
  Range { start: i64, end: i64 },
}

impl EventSelection {
  /// The selected ids in order. Ranges are produced lazily, so a wide range
  /// costs nothing until it is walked.
  pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
    let (list, range) = match self {
      Self::List(ids) => (ids.as_slice(), None),
      Self::Range { start, end } => (&[][..], Some(*start..=*end)),
    };
    list.iter().copied().chain(range.into_iter().flatten())
  }
}

impl FromStr for EventSelection {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let invalid = |reason| Error::InvalidSelection { input: s.to_owned(), reason };

    if s.contains(',') {
      // Entries that are not ids are dropped.
      let ids = s
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
      return Ok(Self::List(ids));
    }

    if let Some((start, end)) = s.split_once('-') {
      let start: i64 = start
        .trim()
        .parse()
        .map_err(|_| invalid("range start is not an id"))?;
      let end: i64 = end
        .trim()
        .parse()
        .map_err(|_| invalid("range end is not an id"))?;
      if end < start {
        return Err(invalid("range end is before its start"));
      }
      return Ok(Self::Range { start, end });
    }

    let id = s.parse().map_err(|_| invalid("not an event id"))?;
    Ok(Self::List(vec![id]))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn list_drops_junk() {
    let sel: EventSelection = "477866, x ,477867,".parse().unwrap();
    assert_eq!(sel.ids().collect::<Vec<_>>(), vec![477866, 477867]);
  }

  #[test]
  fn range_is_inclusive() {
    let sel: EventSelection = "477860-477862".parse().unwrap();
    assert_eq!(sel, EventSelection::Range { start: 477860, end: 477862 });
    assert_eq!(sel.ids().collect::<Vec<_>>(), vec![477860, 477861, 477862]);
  }

  #[test]
  fn single_id() {
    let sel: EventSelection = "42".parse().unwrap();
    assert_eq!(sel.ids().collect::<Vec<_>>(), vec![42]);
  }

  #[test]
  fn widest_range_is_walked_lazily() {
    let sel: EventSelection = "9223372036854775805-9223372036854775807".parse().unwrap();
    assert_eq!(sel.ids().count(), 3);

    let sel: EventSelection = "1-9223372036854775807".parse().unwrap();
    assert_eq!(sel.ids().take(3).collect::<Vec<_>>(), vec![1, 2, 3]);
  }

  #[test]
  fn inverted_range_is_rejected() {
    let err = "20-10".parse::<EventSelection>().unwrap_err();
    assert!(matches!(err, Error::InvalidSelection { .. }));
  }

  #[test]
  fn garbage_is_rejected() {
    assert!("abc".parse::<EventSelection>().is_err());
    assert!("1-b".parse::<EventSelection>().is_err());
  }
}
