//! The league's canonical teams.

/// Abbreviation and full name of every team.
pub const TEAMS: [(&str, &str); 32] = [
    ("ANA", "Anaheim Ducks"),
    ("ARI", "Arizona Coyotes"),
    ("BOS", "Boston Bruins"),
    ("BUF", "Buffalo Sabres"),
    ("CGY", "Calgary Flames"),
    ("CAR", "Carolina Hurricanes"),
    ("CHI", "Chicago Blackhawks"),
    ("COL", "Colorado Avalanche"),
    ("CBJ", "Columbus Blue Jackets"),
    ("DAL", "Dallas Stars"),
    ("DET", "Detroit Red Wings"),
    ("EDM", "Edmonton Oilers"),
    ("FLA", "Florida Panthers"),
    ("LAK", "Los Angeles Kings"),
    ("MIN", "Minnesota Wild"),
    ("MTL", "Montréal Canadiens"),
    ("NSH", "Nashville Predators"),
    ("NJD", "New Jersey Devils"),
    ("NYI", "New York Islanders"),
    ("NYR", "New York Rangers"),
    ("OTT", "Ottawa Senators"),
    ("PHI", "Philadelphia Flyers"),
    ("PIT", "Pittsburgh Penguins"),
    ("SJS", "San Jose Sharks"),
    ("SEA", "Seattle Kraken"),
    ("STL", "St. Louis Blues"),
    ("TBL", "Tampa Bay Lightning"),
    ("TOR", "Toronto Maple Leafs"),
    ("VAN", "Vancouver Canucks"),
    ("VGK", "Vegas Golden Knights"),
    ("WSH", "Washington Capitals"),
    ("WPG", "Winnipeg Jets"),
];

pub fn name_of(abbrev: &str) -> Option<&'static str> {
    TEAMS
        .iter()
        .find(|(candidate, _)| *candidate == abbrev)
        .map(|(_, name)| *name)
}

pub fn abbrev_of(name: &str) -> Option<&'static str> {
    TEAMS
        .iter()
        .find(|(_, candidate)| *candidate == name)
        .map(|(abbrev, _)| *abbrev)
}

/// Full names of all teams, in alphabetical order.
pub fn names() -> Vec<&'static str> {
    let mut names = TEAMS.iter().map(|(_, name)| *name).collect::<Vec<_>>();
    names.sort_unstable();
    names
}

pub fn contains(name: &str) -> bool {
    abbrev_of(name).is_some()
}
