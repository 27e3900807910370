/// Name of the central objective system, always id 0.
pub const FOUNDERS_WORLD_NAME: &str = "Founder's World";

/// Fixed pool of real star names. The generator shuffles this pool per seed and hands names
/// out in system-id order; maps larger than the pool fall back to `System <id>`.
pub const STAR_NAMES: [&str; 99] = [
    "Sol", "Alpha Centauri", "Sirius", "Vega", "Arcturus", "Rigel",
    "Betelgeuse", "Procyon", "Altair", "Deneb", "Polaris", "Capella",
    "Aldebaran", "Antares", "Spica", "Regulus", "Castor", "Pollux",
    "Fomalhaut", "Canopus", "Achernar", "Bellatrix", "Elnath", "Mintaka",
    "Alnitak", "Alnilam", "Saiph", "Mira", "Rasalhague", "Kochab",
    "Dubhe", "Merak", "Phecda", "Megrez", "Alioth", "Alkaid", "Thuban",
    "Etamin", "Rastaban", "Alderamin", "Schedar", "Caph", "Mirfak",
    "Algol", "Hamal", "Sheratan", "Menkar", "Zaurak", "Rana", "Cursa",
    "Arneb", "Nihal", "Wezen", "Aludra", "Furud", "Mirzam", "Naos",
    "Regor", "Avior", "Aspidiske", "Miaplacidus", "Atria", "Peacock",
    "Alnair", "Ankaa", "Diphda", "Markab", "Algenib", "Enif", "Biham",
    "Sadalmelik", "Sadalsuud", "Skat", "Nashira", "Dabih", "Algedi",
    "Nunki", "Kaus Australis", "Sargas", "Shaula", "Lesath", "Graffias",
    "Dschubba", "Zubenelgenubi", "Zubeneschamali", "Unukalhai", "Kornephoros",
    "Yed Prior", "Sabik", "Cebalrai", "Marfik", "Tarazed", "Sadr",
    "Gienah", "Albireo", "Sualocin", "Rotanev", "Alphecca", "Gemma",
];
