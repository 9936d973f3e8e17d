//! Gender/orientation compatibility: who can see whom in discovery.
//! A sees B iff A's wanted set contains B's gender and B's wanted set
//! contains A's gender.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Hetero,
    Homo,
    Bi,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Hetero => "hetero",
            Orientation::Homo => "homo",
            Orientation::Bi => "bi",
        }
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hetero" => Ok(Orientation::Hetero),
            "homo" => Ok(Orientation::Homo),
            "bi" => Ok(Orientation::Bi),
            _ => Err(()),
        }
    }
}

const BOTH: &[Gender] = &[Gender::Male, Gender::Female];
const MALE_ONLY: &[Gender] = &[Gender::Male];
const FEMALE_ONLY: &[Gender] = &[Gender::Female];

/// The genders a profile with this gender/orientation wants to see.
pub fn wanted_genders(gender: Gender, orientation: Orientation) -> &'static [Gender] {
    match (gender, orientation) {
        (Gender::Male, Orientation::Hetero) => FEMALE_ONLY,
        (Gender::Male, Orientation::Homo) => MALE_ONLY,
        (Gender::Female, Orientation::Hetero) => MALE_ONLY,
        (Gender::Female, Orientation::Homo) => FEMALE_ONLY,
        (_, Orientation::Bi) => BOTH,
    }
}

/// String-typed variant for profile rows; unknown values want nobody.
pub fn wanted_for(gender: &str, orientation: &str) -> &'static [Gender] {
    match (Gender::from_str(gender), Orientation::from_str(orientation)) {
        (Ok(g), Ok(o)) => wanted_genders(g, o),
        _ => &[],
    }
}

pub fn is_compatible(
    gender_a: Gender,
    orientation_a: Orientation,
    gender_b: Gender,
    orientation_b: Orientation,
) -> bool {
    wanted_genders(gender_a, orientation_a).contains(&gender_b)
        && wanted_genders(gender_b, orientation_b).contains(&gender_a)
}

/// The orientations a profile of `their_gender` can have and still accept
/// `my_gender`. Used to push the mutual half of the compatibility check
/// into the candidate query.
pub fn orientations_accepting(their_gender: Gender, my_gender: Gender) -> &'static [Orientation] {
    const SAME: &[Orientation] = &[Orientation::Homo, Orientation::Bi];
    const OTHER: &[Orientation] = &[Orientation::Hetero, Orientation::Bi];
    if their_gender == my_gender {
        SAME
    } else {
        OTHER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENDERS: [Gender; 2] = [Gender::Male, Gender::Female];
    const ORIENTATIONS: [Orientation; 3] = [Orientation::Hetero, Orientation::Homo, Orientation::Bi];

    #[test]
    fn compatibility_is_symmetric() {
        for ga in GENDERS {
            for oa in ORIENTATIONS {
                for gb in GENDERS {
                    for ob in ORIENTATIONS {
                        assert_eq!(
                            is_compatible(ga, oa, gb, ob),
                            is_compatible(gb, ob, ga, oa),
                            "asymmetric for {ga:?}/{oa:?} vs {gb:?}/{ob:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn hetero_pair_matches() {
        assert!(is_compatible(
            Gender::Male,
            Orientation::Hetero,
            Gender::Female,
            Orientation::Hetero
        ));
    }

    #[test]
    fn hetero_same_gender_does_not_match() {
        assert!(!is_compatible(
            Gender::Male,
            Orientation::Hetero,
            Gender::Male,
            Orientation::Hetero
        ));
    }

    #[test]
    fn bi_matches_both_genders_of_compatible_counterparts() {
        assert!(is_compatible(
            Gender::Male,
            Orientation::Bi,
            Gender::Male,
            Orientation::Homo
        ));
        assert!(is_compatible(
            Gender::Male,
            Orientation::Bi,
            Gender::Female,
            Orientation::Hetero
        ));
    }

    #[test]
    fn homo_hetero_never_match() {
        for ga in GENDERS {
            for gb in GENDERS {
                assert!(!is_compatible(ga, Orientation::Homo, gb, Orientation::Hetero));
            }
        }
    }

    #[test]
    fn unknown_strings_want_nobody() {
        assert!(wanted_for("male", "unknown").is_empty());
        assert!(wanted_for("", "bi").is_empty());
        assert_eq!(wanted_for("female", "hetero"), &[Gender::Male]);
    }

    #[test]
    fn accepting_orientations_agree_with_wanted_sets() {
        for their in GENDERS {
            for mine in GENDERS {
                for o in ORIENTATIONS {
                    let accepts = orientations_accepting(their, mine).contains(&o);
                    let wants = wanted_genders(their, o).contains(&mine);
                    assert_eq!(accepts, wants, "{their:?} {o:?} accepting {mine:?}");
                }
            }
        }
    }
}
