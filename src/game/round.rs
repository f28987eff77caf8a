//! Round resolution for a full room

use crate::matchmaking::registry::{Room, RoomId, ROOM_CAPACITY};
use crate::ws::protocol::ConnectionId;

use super::rules::{Move, Outcome};

/// One occupant's result for a resolved round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatResult {
    pub connection_id: ConnectionId,
    pub outcome: Outcome,
    pub opponent_move: Move,
}

/// Everything the hub needs to announce a resolved round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub room_id: RoomId,
    /// Results in seat order
    pub seats: [SeatResult; 2],
    /// Summary line naming both players and their moves
    pub log: String,
}

/// Resolve the room's round if both seats are taken and both moves are in.
///
/// On resolution both pending moves are cleared so the room waits for the
/// next round. Returns `None` and leaves the room untouched otherwise.
pub fn resolve(room: &mut Room) -> Option<RoundReport> {
    if room.len() != ROOM_CAPACITY {
        return None;
    }

    let (first, second) = match room.occupants() {
        [a, b] => (a, b),
        _ => return None,
    };
    let (first_move, second_move) = (first.pending_move?, second.pending_move?);

    let outcome = first_move.against(second_move);
    let seats = [
        SeatResult {
            connection_id: first.connection_id,
            outcome,
            opponent_move: second_move,
        },
        SeatResult {
            connection_id: second.connection_id,
            outcome: outcome.inverse(),
            opponent_move: first_move,
        },
    ];
    let log = format!(
        "{} chose {}\n{} chose {}",
        first.name, first_move, second.name, second_move
    );

    for occupant in room.occupants_mut() {
        occupant.pending_move = None;
    }

    Some(RoundReport {
        room_id: room.id().to_string(),
        seats,
        log,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::matchmaking::registry::{MoveOutcome, RoomRegistry};

    fn play(first: Move, second: Move) -> (ConnectionId, ConnectionId, RoundReport) {
        let mut registry = RoomRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.join(a, "ana".into()).unwrap();
        registry.join(b, "bo".into()).unwrap();

        registry.submit_move(a, first).unwrap();
        match registry.submit_move(b, second).unwrap() {
            MoveOutcome::Resolved(report) => (a, b, report),
            MoveOutcome::Pending { .. } => panic!("round should resolve"),
        }
    }

    #[test]
    fn rock_beats_scissors() {
        let (a, b, report) = play(Move::Rock, Move::Scissors);
        assert_eq!(
            report.seats,
            [
                SeatResult {
                    connection_id: a,
                    outcome: Outcome::Win,
                    opponent_move: Move::Scissors,
                },
                SeatResult {
                    connection_id: b,
                    outcome: Outcome::Lose,
                    opponent_move: Move::Rock,
                },
            ]
        );
    }

    #[test]
    fn paper_against_paper_draws() {
        let (_, _, report) = play(Move::Paper, Move::Paper);
        assert!(report.seats.iter().all(|s| s.outcome == Outcome::Draw));
    }

    #[test]
    fn second_seat_can_win() {
        let (_, _, report) = play(Move::Paper, Move::Scissors);
        assert_eq!(report.seats[0].outcome, Outcome::Lose);
        assert_eq!(report.seats[1].outcome, Outcome::Win);
    }

    #[test]
    fn log_names_both_players_and_moves() {
        let (_, _, report) = play(Move::Rock, Move::Paper);
        assert_eq!(report.log, "ana chose ROCK (🪨)\nbo chose PAPER (📄)");
    }

    #[test]
    fn incomplete_round_is_left_alone() {
        let mut registry = RoomRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let room_id = registry.join(a, "ana".into()).unwrap().room_id;
        registry.join(b, "bo".into()).unwrap();
        registry.submit_move(a, Move::Rock).unwrap();

        let room = registry.room(&room_id).unwrap();
        assert_eq!(room.occupants()[0].pending_move, Some(Move::Rock));
        assert_eq!(room.occupants()[1].pending_move, None);
    }
}
