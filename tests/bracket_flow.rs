//! Scenario tests for the seeding engine and match lifecycle
//!
//! These walk a generated first round through the administrative state
//! machine the way an admin would, without touching a database.

#[cfg(test)]
mod bracket_flow_tests {
    use chrono::{TimeZone, Utc};
    use dynasty_brackets::entities::{ApprovalStatus, Competitor};
    use dynasty_brackets::lifecycle::{LifecycleError, Match, MatchAction, MatchStatus};
    use dynasty_brackets::seeding::{
        FIRST_ROUND, InitialAssignment, SeedingError, generate_first_round,
    };

    fn roster(ratings: &[i64]) -> Vec<Competitor> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, &rating)| Competitor {
                id: i as i64 + 1,
                display_name: format!("player-{}", i + 1),
                rating,
                group_id: 3,
                approval: ApprovalStatus::Approved,
            })
            .collect()
    }

    fn materialize(ratings: &[i64]) -> Vec<Match> {
        let round =
            generate_first_round(3, &roster(ratings), InitialAssignment::Unscheduled).unwrap();
        round
            .pairings
            .into_iter()
            .enumerate()
            .map(|(i, seed)| seed.into_match(i as i64 + 1, Utc::now()))
            .collect()
    }

    #[test]
    fn test_eight_player_bracket_shape() {
        let competitors = roster(&[2100, 1950, 1800, 1700, 1650, 1500, 1400, 1200]);
        let round =
            generate_first_round(3, &competitors, InitialAssignment::Unscheduled).unwrap();

        assert_eq!(round.round, FIRST_ROUND);
        assert_eq!(round.pairings.len(), 4);
        assert!(round.bye.is_none());

        // Rank 1 meets rank 8, rank 4 meets rank 5
        assert_eq!(round.pairings[0].side_a, 1);
        assert_eq!(round.pairings[0].side_b, 8);
        assert_eq!(round.pairings[3].side_a, 4);
        assert_eq!(round.pairings[3].side_b, 5);
    }

    #[test]
    fn test_five_player_bracket_reports_the_bye() {
        let round = generate_first_round(
            3,
            &roster(&[2100, 1950, 1800, 1700, 1650]),
            InitialAssignment::Unscheduled,
        )
        .unwrap();

        assert_eq!(round.pairings.len(), 2);
        let bye = round.bye.expect("median competitor advances on a bye");
        assert_eq!(bye.id, 3);
    }

    #[test]
    fn test_empty_and_singleton_pools_error_out() {
        for ratings in [&[][..], &[1500][..]] {
            let err = generate_first_round(3, &roster(ratings), InitialAssignment::Unscheduled)
                .unwrap_err();
            assert!(matches!(
                err,
                SeedingError::InsufficientCompetitors { needed: 2, .. }
            ));
        }
    }

    #[test]
    fn test_admin_walks_a_match_to_completion() {
        let mut matches = materialize(&[2100, 1950, 1800, 1700]);
        let slot = &mut matches[0];
        let kickoff = Utc.with_ymd_and_hms(2026, 9, 20, 19, 30, 0).unwrap();

        slot.schedule(kickoff).unwrap();
        slot.mark_reviewed().unwrap();
        assert!(slot.is_reviewed);

        let moved = Utc.with_ymd_and_hms(2026, 9, 27, 19, 30, 0).unwrap();
        slot.reschedule(moved).unwrap();
        assert_eq!(slot.scheduled_for, Some(moved));

        slot.advance().unwrap();
        slot.finish(slot.side_a).unwrap();
        assert_eq!(slot.status, MatchStatus::Completed);
        assert_eq!(slot.winner, Some(slot.side_a));
    }

    #[test]
    fn test_prediction_snapshot_survives_the_lifecycle() {
        let mut matches = materialize(&[2800, 2400]);
        let slot = &mut matches[0];
        let snapshot = (slot.predicted_winner, slot.win_probability);
        assert_eq!(snapshot, (1, 91));

        slot.schedule(Utc::now()).unwrap();
        slot.advance().unwrap();
        // The underdog wins; the snapshot still records the pairing-time
        // prediction
        slot.finish(slot.side_b).unwrap();
        assert_eq!((slot.predicted_winner, slot.win_probability), snapshot);
    }

    #[test]
    fn test_out_of_state_actions_name_the_problem() {
        let mut matches = materialize(&[2100, 1950]);
        let slot = &mut matches[0];

        let err = slot.mark_reviewed().unwrap_err();
        assert_eq!(
            err,
            LifecycleError::IllegalTransition {
                action: MatchAction::MarkReviewed,
                status: MatchStatus::PendingSchedule,
            }
        );
        // The message is presentable as-is
        assert_eq!(
            err.to_string(),
            "cannot mark reviewed a match that is pending_schedule"
        );
    }

    #[test]
    fn test_rejected_slot_stays_rejected() {
        let mut matches = materialize(&[2100, 1950]);
        let slot = &mut matches[0];

        slot.reject().unwrap();
        assert!(slot.status.is_terminal());
        assert!(slot.schedule(Utc::now()).is_err());
        assert!(slot.advance().is_err());
        assert!(slot.finish(slot.side_a).is_err());
    }
}
